//! The estimate intake form: every field, its constraints, and the rules
//! that switch conditional fields on and off.

use std::collections::HashMap;

use serde_json::json;

use crate::record::FormRecord;
use crate::schema::codes::{
    ChillerMode, CodedEnum, Crop, CustomerType, HydroponicType, MarketingBudget, SpaceType,
    SystemType,
};
use crate::schema::field::{FieldKind, FieldSchema, FieldSpec, Pattern, SchemaError};
use crate::schema::rules::{ConditionalRule, Predicate};
use crate::steps::STEPS;

pub mod path {
    pub const CUSTOMER_TYPE: &str = "customer.customerType";
    pub const CUSTOMER_TYPE_OTHER: &str = "customer.customerTypeOther";
    pub const CUSTOMER_NAME: &str = "customer.name";
    pub const CUSTOMER_PHONE: &str = "customer.phone";
    pub const CUSTOMER_EMAIL: &str = "customer.email";

    pub const SPACE_TYPE: &str = "space.spaceType";
    pub const SPACE_TYPE_OTHER: &str = "space.spaceTypeOther";
    pub const SPACE_WIDTH: &str = "space.widthM";
    pub const SPACE_LENGTH: &str = "space.lengthM";
    pub const SPACE_HEIGHT: &str = "space.heightM";

    pub const SELECTED_CROPS: &str = "crops.selectedCrops";
    pub const CROP_OTHER: &str = "crops.cropOther";
    pub const PRIMARY_CROP: &str = "crops.primaryCrop";

    pub const SYSTEM_TYPE: &str = "system.systemType";
    pub const FIXED_RACK_TIERS: &str = "system.fixedRackTiers";
    pub const HYDROPONIC_TYPE: &str = "system.hydroponicType";
    pub const ENV_CONTROL_INCLUDED: &str = "system.envControlIncluded";
    pub const HVAC_AC: &str = "system.hvac.ac";
    pub const HVAC_HEAT_EXCHANGER: &str = "system.hvac.heatExchanger";
    pub const HVAC_CIRCULATION_FAN: &str = "system.hvac.circulationFan";
    pub const HVAC_AIR_CIRCULATOR: &str = "system.hvac.airCirculator";
    pub const HVAC_USE_DEFAULT: &str = "system.hvac.useDefaultRecommended";
    pub const NUTRIENT_AUTO_AB: &str = "system.nutrientSystem.autoAB";
    pub const NUTRIENT_AUTO_C: &str = "system.nutrientSystem.autoC";
    pub const NUTRIENT_AUTO_EC: &str = "system.nutrientSystem.autoEC";
    pub const NUTRIENT_AUTO_PH: &str = "system.nutrientSystem.autoPH";
    pub const NUTRIENT_USE_DEFAULT: &str = "system.nutrientSystem.useDefaultRecommended";
    pub const CHILLER_MODE: &str = "system.chiller.mode";
    pub const CHILLER_HP: &str = "system.chiller.hp";

    pub const STAFF_COUNT: &str = "operation.staffCount";
    pub const MONTHLY_SALARY_PER_STAFF: &str = "operation.monthlySalaryPerStaff";
    pub const IS_RENTED: &str = "operation.isRented";
    pub const MONTHLY_RENT: &str = "operation.monthlyRent";
    pub const USE_LOAN: &str = "operation.useLoan";
    pub const LOAN_AMOUNT: &str = "operation.loanAmount";
    pub const LOAN_INTEREST_RATE: &str = "operation.loanInterestRate";
    pub const LOAN_TERM_YEARS: &str = "operation.loanTermYears";
    pub const GRACE_PERIOD_YEARS: &str = "operation.gracePeriodYears";
    pub const TARGET_MONTHLY_REVENUE: &str = "operation.targetMonthlyRevenue";
    pub const MARKETING_BUDGET: &str = "operation.marketingBudget";
}

pub const SECTIONS: [&str; 5] = ["customer", "space", "crops", "system", "operation"];

const PHONE_PATTERN: &str = "01[0-9]-?[0-9]{3,4}-?[0-9]{4}";
const EMAIL_PATTERN: &str =
    r"[A-Za-z0-9_'+\-]+(?:\.[A-Za-z0-9_'+\-]+)*@(?:[A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}";

const RACK_TIERS: &[f64] = &[5.0, 6.0, 7.0, 8.0];
const LOAN_TERMS: &[f64] = &[3.0, 5.0, 7.0, 10.0];
const GRACE_PERIODS: &[f64] = &[0.0, 1.0];

const HVAC_FIELDS: [&str; 5] = [
    path::HVAC_AC,
    path::HVAC_HEAT_EXCHANGER,
    path::HVAC_CIRCULATION_FAN,
    path::HVAC_AIR_CIRCULATOR,
    path::HVAC_USE_DEFAULT,
];

const NUTRIENT_FIELDS: [&str; 5] = [
    path::NUTRIENT_AUTO_AB,
    path::NUTRIENT_AUTO_C,
    path::NUTRIENT_AUTO_EC,
    path::NUTRIENT_AUTO_PH,
    path::NUTRIENT_USE_DEFAULT,
];

const CHILLER_FIELDS: [&str; 2] = [path::CHILLER_MODE, path::CHILLER_HP];

const LOAN_FIELDS: [&str; 4] =
    [path::LOAN_AMOUNT, path::LOAN_INTEREST_RATE, path::LOAN_TERM_YEARS, path::GRACE_PERIOD_YEARS];

/// Schema plus conditional-activation table, checked for consistency with
/// the step table at construction.
#[derive(Clone, Debug)]
pub struct FormDefinition {
    schema: FieldSchema,
    rules: Vec<ConditionalRule>,
}

impl FormDefinition {
    pub fn new(schema: FieldSchema, rules: Vec<ConditionalRule>) -> Result<Self, SchemaError> {
        for rule in &rules {
            for referenced in [rule.trigger, rule.dependent] {
                if !schema.contains(referenced) {
                    return Err(SchemaError::UnknownRuleField(referenced));
                }
            }
        }

        let mut owners: HashMap<&str, usize> = HashMap::new();
        for step in &STEPS {
            for field in step.fields {
                if !schema.contains(field) {
                    return Err(SchemaError::UnknownStepField { step: step.id.code(), path: *field });
                }
                *owners.entry(*field).or_default() += 1;
            }
        }
        if let Some(unowned) = schema.paths().find(|path| owners.get(path) != Some(&1)) {
            return Err(SchemaError::StepOwnership(unowned));
        }

        Ok(Self { schema, rules })
    }

    /// The estimate intake form as shipped.
    pub fn standard() -> Result<Self, SchemaError> {
        Self::new(standard_schema()?, standard_rules())
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }
}

fn text(min_len: usize, max_len: usize) -> FieldKind {
    FieldKind::Text { min_len: Some(min_len), max_len: Some(max_len), pattern: None }
}

fn number(min: f64, max: f64) -> FieldKind {
    FieldKind::Number { min: Some(min), max: Some(max) }
}

fn one_of<E: CodedEnum>() -> FieldKind {
    FieldKind::Enum { members: E::codes() }
}

pub fn standard_schema() -> Result<FieldSchema, SchemaError> {
    let phone = Pattern::whole(PHONE_PATTERN, "must be a mobile number such as 010-1234-5678")?;
    let email = Pattern::whole(EMAIL_PATTERN, "must be a valid email address")?;

    let mut fields = vec![
        FieldSpec::required(path::CUSTOMER_TYPE, one_of::<CustomerType>()),
        FieldSpec::required(path::CUSTOMER_TYPE_OTHER, text(1, 100)),
        FieldSpec::required(path::CUSTOMER_NAME, text(2, 50)),
        FieldSpec::required(
            path::CUSTOMER_PHONE,
            FieldKind::Text { min_len: None, max_len: None, pattern: Some(phone) },
        ),
        FieldSpec::required(
            path::CUSTOMER_EMAIL,
            FieldKind::Text { min_len: None, max_len: None, pattern: Some(email) },
        ),
        FieldSpec::optional(path::SPACE_TYPE, one_of::<SpaceType>()),
        FieldSpec::required(path::SPACE_TYPE_OTHER, text(1, 100)),
        FieldSpec::required(path::SPACE_WIDTH, number(1.0, 100.0)),
        FieldSpec::required(path::SPACE_LENGTH, number(1.0, 100.0)),
        FieldSpec::required(path::SPACE_HEIGHT, number(2.0, 10.0)),
        FieldSpec::required(
            path::SELECTED_CROPS,
            FieldKind::EnumArray { members: Crop::codes(), min_items: 1 },
        ),
        FieldSpec::required(path::CROP_OTHER, text(1, 100)),
        FieldSpec::optional(path::PRIMARY_CROP, one_of::<Crop>()),
        FieldSpec::required(path::SYSTEM_TYPE, one_of::<SystemType>()),
        FieldSpec::required(path::FIXED_RACK_TIERS, FieldKind::NumberChoice { allowed: RACK_TIERS }),
        FieldSpec::required(path::HYDROPONIC_TYPE, one_of::<HydroponicType>()),
        FieldSpec::required(path::ENV_CONTROL_INCLUDED, FieldKind::Boolean),
    ];
    fields.extend(
        HVAC_FIELDS
            .iter()
            .chain(NUTRIENT_FIELDS.iter())
            .map(|field| FieldSpec::optional(field, FieldKind::Boolean)),
    );
    fields.extend([
        FieldSpec::optional(path::CHILLER_MODE, one_of::<ChillerMode>()),
        FieldSpec::optional(path::CHILLER_HP, number(0.0, 100.0)),
        FieldSpec::optional(path::STAFF_COUNT, number(0.0, 10.0)),
        FieldSpec::optional(path::MONTHLY_SALARY_PER_STAFF, number(100.0, 600.0)),
        FieldSpec::optional(path::IS_RENTED, FieldKind::Boolean),
        FieldSpec::required(path::MONTHLY_RENT, number(0.0, 2000.0)),
        FieldSpec::optional(path::USE_LOAN, FieldKind::Boolean),
        FieldSpec::required(path::LOAN_AMOUNT, number(0.0, 100_000.0)),
        FieldSpec::optional(path::LOAN_INTEREST_RATE, number(0.0, 20.0)),
        FieldSpec::optional(path::LOAN_TERM_YEARS, FieldKind::NumberChoice { allowed: LOAN_TERMS }),
        FieldSpec::optional(
            path::GRACE_PERIOD_YEARS,
            FieldKind::NumberChoice { allowed: GRACE_PERIODS },
        ),
        FieldSpec::optional(path::TARGET_MONTHLY_REVENUE, number(0.0, 100_000.0)),
        FieldSpec::optional(path::MARKETING_BUDGET, one_of::<MarketingBudget>()),
    ]);

    FieldSchema::new(fields)
}

pub fn standard_rules() -> Vec<ConditionalRule> {
    let mut rules = vec![
        ConditionalRule::new(
            path::CUSTOMER_TYPE,
            Predicate::Equals("other"),
            path::CUSTOMER_TYPE_OTHER,
        ),
        ConditionalRule::new(path::SPACE_TYPE, Predicate::Equals("other"), path::SPACE_TYPE_OTHER),
        ConditionalRule::new(path::SELECTED_CROPS, Predicate::Contains("other"), path::CROP_OTHER),
        ConditionalRule::new(
            path::SYSTEM_TYPE,
            Predicate::Equals("fixed_rack_custom"),
            path::FIXED_RACK_TIERS,
        ),
        ConditionalRule::new(path::IS_RENTED, Predicate::IsTrue, path::MONTHLY_RENT),
    ];

    let env_controlled = HVAC_FIELDS.iter().chain(NUTRIENT_FIELDS.iter()).chain(CHILLER_FIELDS.iter());
    rules.extend(env_controlled.map(|dependent| {
        ConditionalRule::new(path::ENV_CONTROL_INCLUDED, Predicate::IsTrue, dependent)
    }));
    rules.extend(
        LOAN_FIELDS
            .iter()
            .map(|dependent| ConditionalRule::new(path::USE_LOAN, Predicate::IsTrue, dependent)),
    );

    rules
}

/// Pre-filled starting point for a new wizard session.
pub fn default_record() -> FormRecord {
    let value = json!({
        "customer": {
            "customerType": "startup",
            "name": "",
            "phone": "",
            "email": "",
        },
        "space": {
            "spaceType": "empty_room",
            "widthM": 5,
            "lengthM": 4,
            "heightM": 2.5,
        },
        "crops": {
            "selectedCrops": ["europe_lettuce"],
        },
        "system": {
            "systemType": "smart_garden_4tier",
            "hydroponicType": "ebb_flow",
            "envControlIncluded": true,
        },
        "operation": {},
    });

    FormRecord::from_value(value).unwrap_or_default()
}
