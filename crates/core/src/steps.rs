use serde::{Deserialize, Serialize};

use crate::schema::catalog::path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Customer,
    SpaceCrops,
    System,
    Operation,
    Review,
}

pub const STEP_COUNT: usize = 5;

pub const STEP_ORDER: [StepId; STEP_COUNT] =
    [StepId::Customer, StepId::SpaceCrops, StepId::System, StepId::Operation, StepId::Review];

/// A fixed entry in the step sequence and the fields it renders and gates on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: StepId,
    pub fields: &'static [&'static str],
}

pub const STEPS: [StepDefinition; STEP_COUNT] = [
    StepDefinition {
        id: StepId::Customer,
        fields: &[
            path::CUSTOMER_TYPE,
            path::CUSTOMER_TYPE_OTHER,
            path::CUSTOMER_NAME,
            path::CUSTOMER_PHONE,
            path::CUSTOMER_EMAIL,
        ],
    },
    StepDefinition {
        id: StepId::SpaceCrops,
        fields: &[
            path::SPACE_TYPE,
            path::SPACE_TYPE_OTHER,
            path::SPACE_WIDTH,
            path::SPACE_LENGTH,
            path::SPACE_HEIGHT,
            path::SELECTED_CROPS,
            path::CROP_OTHER,
            path::PRIMARY_CROP,
        ],
    },
    StepDefinition {
        id: StepId::System,
        fields: &[
            path::SYSTEM_TYPE,
            path::FIXED_RACK_TIERS,
            path::HYDROPONIC_TYPE,
            path::ENV_CONTROL_INCLUDED,
            path::HVAC_AC,
            path::HVAC_HEAT_EXCHANGER,
            path::HVAC_CIRCULATION_FAN,
            path::HVAC_AIR_CIRCULATOR,
            path::HVAC_USE_DEFAULT,
            path::NUTRIENT_AUTO_AB,
            path::NUTRIENT_AUTO_C,
            path::NUTRIENT_AUTO_EC,
            path::NUTRIENT_AUTO_PH,
            path::NUTRIENT_USE_DEFAULT,
            path::CHILLER_MODE,
            path::CHILLER_HP,
        ],
    },
    StepDefinition {
        id: StepId::Operation,
        fields: &[
            path::STAFF_COUNT,
            path::MONTHLY_SALARY_PER_STAFF,
            path::IS_RENTED,
            path::MONTHLY_RENT,
            path::USE_LOAN,
            path::LOAN_AMOUNT,
            path::LOAN_INTEREST_RATE,
            path::LOAN_TERM_YEARS,
            path::GRACE_PERIOD_YEARS,
            path::TARGET_MONTHLY_REVENUE,
            path::MARKETING_BUDGET,
        ],
    },
    StepDefinition { id: StepId::Review, fields: &[] },
];

impl StepId {
    pub fn index(self) -> usize {
        match self {
            Self::Customer => 0,
            Self::SpaceCrops => 1,
            Self::System => 2,
            Self::Operation => 3,
            Self::Review => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        STEP_ORDER.get(index).copied()
    }

    pub fn first() -> Self {
        STEP_ORDER[0]
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    /// Review is terminal: its only forward move is submission.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Review)
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::SpaceCrops => "space_crops",
            Self::System => "system",
            Self::Operation => "operation",
            Self::Review => "review",
        }
    }

    pub fn ordinal(self) -> usize {
        self.index() + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Customer => "Customer information",
            Self::SpaceCrops => "Space & crops",
            Self::System => "System configuration",
            Self::Operation => "Operation & finance",
            Self::Review => "Review",
        }
    }

    /// Assistant line shown above the step.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Customer => {
                "Hello! Let's start with the basics so we know where to send your estimate."
            }
            Self::SpaceCrops => {
                "Tell us about the indoor space and what you want to grow. Rough numbers are fine."
            }
            Self::System => {
                "Now let's pick the growing system. Smart Garden and moving racks are our usual recommendation."
            }
            Self::Operation => {
                "Finally, staffing, rent and financing details help us judge profitability and payback."
            }
            Self::Review => {
                "Here is everything you entered. Check it over and submit when you are ready."
            }
        }
    }

    pub fn progress_percent(self) -> u8 {
        let ratio = self.ordinal() as f64 / STEP_COUNT as f64;
        (ratio * 100.0).round() as u8
    }

    pub fn definition(self) -> &'static StepDefinition {
        &STEPS[self.index()]
    }
}

pub fn fields_owned_by(step: StepId) -> &'static [&'static str] {
    step.definition().fields
}

#[cfg(test)]
mod tests {
    use super::{fields_owned_by, StepId, STEPS, STEP_ORDER};
    use crate::schema::catalog::path;

    #[test]
    fn order_is_fixed_and_total() {
        for (index, step) in STEP_ORDER.iter().enumerate() {
            assert_eq!(step.index(), index);
            assert_eq!(StepId::from_index(index), Some(*step));
            assert_eq!(STEPS[index].id, *step);
        }
        assert_eq!(StepId::from_index(5), None);
        assert_eq!(StepId::first(), StepId::Customer);
    }

    #[test]
    fn navigation_neighbours() {
        assert_eq!(StepId::Customer.previous(), None);
        assert_eq!(StepId::Customer.next(), Some(StepId::SpaceCrops));
        assert_eq!(StepId::Operation.next(), Some(StepId::Review));
        assert_eq!(StepId::Review.next(), None);
        assert!(StepId::Review.is_terminal());
        assert!(!StepId::Operation.is_terminal());
    }

    #[test]
    fn progress_matches_position() {
        assert_eq!(StepId::Customer.progress_percent(), 20);
        assert_eq!(StepId::System.progress_percent(), 60);
        assert_eq!(StepId::Review.progress_percent(), 100);
    }

    #[test]
    fn review_owns_no_fields() {
        assert!(fields_owned_by(StepId::Review).is_empty());
        assert!(fields_owned_by(StepId::Customer).contains(&path::CUSTOMER_TYPE_OTHER));
        assert!(fields_owned_by(StepId::System).contains(&path::FIXED_RACK_TIERS));
    }

    #[test]
    fn step_codes_match_wire_format() {
        for step in STEP_ORDER {
            let encoded = serde_json::to_value(step).expect("encode step");
            assert_eq!(encoded, serde_json::json!(step.code()));
        }
    }
}
