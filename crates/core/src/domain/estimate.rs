use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::customer::CustomerId;
use crate::errors::DomainError;
use crate::schema::codes::{
    ChillerMode, Crop, CustomerType, HydroponicType, MarketingBudget, SpaceType, SystemType,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EstimateId(pub Uuid);

impl EstimateId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EstimateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    Submitted,
}

impl EstimateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "submitted" => Ok(Self::Submitted),
            other => Err(DomainError::InvariantViolation(format!("unknown estimate status `{other}`"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSection {
    pub customer_type: CustomerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_type_other: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_type: Option<SpaceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_type_other: Option<String>,
    pub width_m: f64,
    pub length_m: f64,
    pub height_m: f64,
}

impl SpaceSection {
    pub fn floor_area_m2(&self) -> f64 {
        self.width_m * self.length_m
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropsSection {
    pub selected_crops: Vec<Crop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_other: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_crop: Option<Crop>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HvacOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_exchanger: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circulation_fan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_circulator: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_default_recommended: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutrientOptions {
    #[serde(rename = "autoAB", default, skip_serializing_if = "Option::is_none")]
    pub auto_ab: Option<bool>,
    #[serde(rename = "autoC", default, skip_serializing_if = "Option::is_none")]
    pub auto_c: Option<bool>,
    #[serde(rename = "autoEC", default, skip_serializing_if = "Option::is_none")]
    pub auto_ec: Option<bool>,
    #[serde(rename = "autoPH", default, skip_serializing_if = "Option::is_none")]
    pub auto_ph: Option<bool>,
    #[serde(rename = "useDefaultRecommended", default, skip_serializing_if = "Option::is_none")]
    pub use_default_recommended: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChillerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ChillerMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSection {
    pub system_type: SystemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_rack_tiers: Option<u8>,
    pub hydroponic_type: HydroponicType,
    pub env_control_included: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvac: Option<HvacOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient_system: Option<NutrientOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chiller: Option<ChillerOptions>,
}

/// Operating and financing inputs. Every field is optional; amounts are in
/// ten-thousand KRW units as entered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_salary_per_staff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_rented: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_loan: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_interest_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_term_years: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_years: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_monthly_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_budget: Option<MarketingBudget>,
}

/// The canonical payload: every active, validated value, typed per section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    pub customer: CustomerSection,
    pub space: SpaceSection,
    pub crops: CropsSection,
    pub system: SystemSection,
    #[serde(default)]
    pub operation: OperationSection,
}

impl EstimateRecord {
    pub fn from_canonical(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Each top-level section as its own JSON object, in record order.
    pub fn section_json(&self) -> Result<[(&'static str, Value); 5], serde_json::Error> {
        Ok([
            ("customer", serde_json::to_value(&self.customer)?),
            ("space", serde_json::to_value(&self.space)?),
            ("crops", serde_json::to_value(&self.crops)?),
            ("system", serde_json::to_value(&self.system)?),
            ("operation", serde_json::to_value(&self.operation)?),
        ])
    }
}

/// Estimate write handed to persistence once the customer row exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewEstimate {
    pub customer_id: CustomerId,
    pub record: EstimateRecord,
    /// Everything the user entered, dormant conditional values included.
    pub raw_input: Value,
    pub status: EstimateStatus,
}

impl NewEstimate {
    pub fn submitted(customer_id: CustomerId, record: EstimateRecord, raw_input: Value) -> Self {
        Self { customer_id, record, raw_input, status: EstimateStatus::Submitted }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: EstimateId,
    pub customer_id: CustomerId,
    pub record: EstimateRecord,
    pub raw_input: Value,
    pub status: EstimateStatus,
    pub created_at: DateTime<Utc>,
}

impl Estimate {
    pub fn from_new(id: EstimateId, new: NewEstimate, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id: new.customer_id,
            record: new.record,
            raw_input: new.raw_input,
            status: new.status,
            created_at,
        }
    }
}

/// Identifiers assigned by a successful submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub customer_id: CustomerId,
    pub estimate_id: EstimateId,
}
