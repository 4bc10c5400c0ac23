//! Closed code sets used by enum fields, each with a fixed display label.

use serde::{Deserialize, Serialize};

pub trait CodedEnum: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn code(self) -> &'static str;

    fn label(self) -> &'static str;

    fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|variant| variant.code() == code)
    }

    fn codes() -> Vec<&'static str> {
        Self::ALL.iter().map(|variant| variant.code()).collect()
    }
}

/// Display label for a raw code; unrecognized codes are shown verbatim.
pub fn label_for<E: CodedEnum>(code: &str) -> String {
    E::from_code(code).map(|variant| variant.label().to_string()).unwrap_or_else(|| code.to_string())
}

macro_rules! coded_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => ($code:literal, $label:literal)),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl CodedEnum for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }
    };
}

coded_enum!(CustomerType {
    School => ("school", "School / educational institution"),
    Hospital => ("hospital", "Hospital / care facility"),
    Welfare => ("welfare", "Welfare facility"),
    Startup => ("startup", "Startup / smart-farm venture"),
    CafeRestaurant => ("cafe_restaurant", "Cafe / restaurant"),
    Lab => ("lab", "Corporate research lab"),
    Other => ("other", "Other"),
});

coded_enum!(SpaceType {
    EmptyRoom => ("empty_room", "Empty room"),
    GreenhousePartial => ("greenhouse_partial", "Part of a greenhouse"),
    HospitalSpace => ("hospital_space", "Hospital space"),
    FactoryWarehouse => ("factory_warehouse", "Factory / warehouse"),
    Other => ("other", "Other"),
});

coded_enum!(Crop {
    EuropeLettuce => ("europe_lettuce", "European lettuce"),
    Herb => ("herb", "Herbs"),
    Microgreen => ("microgreen", "Microgreens"),
    Strawberry => ("strawberry", "Strawberry"),
    Wasabi => ("wasabi", "Wasabi"),
    Ornamental => ("ornamental", "Ornamental / smart garden"),
    Other => ("other", "Other"),
});

coded_enum!(SystemType {
    SmartGarden4Tier => ("smart_garden_4tier", "Smart Garden, 4 tiers"),
    MovingRack4Tier => ("moving_rack_4tier", "Moving rack, 4 tiers"),
    FixedRackCustom => ("fixed_rack_custom", "Fixed rack, custom height"),
});

coded_enum!(HydroponicType {
    EbbFlow => ("ebb_flow", "Ebb & Flow (flood irrigation)"),
    Aeroponic => ("aeroponic", "Aeroponic (root misting)"),
});

coded_enum!(ChillerMode {
    Manual => ("manual", "Manual"),
    Auto => ("auto", "Automatic"),
});

coded_enum!(MarketingBudget {
    None0To20 => ("none_0_20", "None to 20M KRW"),
    Small20To50 => ("small_20_50", "20M to 50M KRW"),
    Medium50To100 => ("medium_50_100", "50M to 100M KRW"),
    Large100Plus => ("large_100_plus", "100M KRW or more"),
    Unknown => ("unknown", "Undecided"),
});

#[cfg(test)]
mod tests {
    use super::{label_for, CodedEnum, Crop, CustomerType, MarketingBudget, SystemType};

    #[test]
    fn codes_round_trip_through_serde() {
        let encoded = serde_json::to_value(SystemType::SmartGarden4Tier).expect("encode");
        assert_eq!(encoded, serde_json::json!("smart_garden_4tier"));

        let decoded: MarketingBudget =
            serde_json::from_value(serde_json::json!("large_100_plus")).expect("decode");
        assert_eq!(decoded, MarketingBudget::Large100Plus);
    }

    #[test]
    fn unknown_codes_fall_back_to_the_raw_code() {
        assert_eq!(label_for::<Crop>("wasabi"), "Wasabi");
        assert_eq!(label_for::<Crop>("saffron"), "saffron");
    }

    #[test]
    fn code_lists_follow_declaration_order() {
        assert_eq!(
            CustomerType::codes(),
            vec!["school", "hospital", "welfare", "startup", "cafe_restaurant", "lab", "other"]
        );
        assert_eq!(CustomerType::from_code("lab"), Some(CustomerType::Lab));
        assert_eq!(CustomerType::from_code("farm"), None);
    }
}
