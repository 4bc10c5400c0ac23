//! Read-only digest of everything entered so far, shown on the review step.

use serde::Serialize;
use serde_json::Value;

use crate::record::FormRecord;
use crate::schema::catalog::{path, FormDefinition};
use crate::schema::codes::{
    label_for, ChillerMode, CodedEnum, Crop, CustomerType, HydroponicType, MarketingBudget,
    SpaceType, SystemType,
};
use crate::steps::{fields_owned_by, StepId};
use crate::visibility::{active_fields, ActiveFields};

pub const NOT_PROVIDED: &str = "Not provided";

const MONEY_UNIT: &str = "x10k KRW";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub label: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummarySection {
    pub step: StepId,
    pub key: &'static str,
    pub title: &'static str,
    pub lines: Vec<SummaryLine>,
}

impl SummarySection {
    pub fn value_of(&self, label: &str) -> Option<&str> {
        self.lines.iter().find(|line| line.label == label).map(|line| line.value.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub sections: Vec<SummarySection>,
}

impl ReviewSummary {
    pub fn section(&self, key: &str) -> Option<&SummarySection> {
        self.sections.iter().find(|section| section.key == key)
    }
}

/// Builds the summary from currently active values only. Unknown codes are
/// shown verbatim; the operation section appears once any of its fields holds
/// an active value.
pub fn review_summary(form: &FormDefinition, record: &FormRecord) -> ReviewSummary {
    let active = active_fields(form.schema(), form.rules(), record);
    let view = ActiveView { record, active: &active };

    let mut sections = vec![
        customer_section(&view),
        space_section(&view),
        crops_section(&view),
        system_section(&view),
    ];
    if let Some(operation) = operation_section(&view) {
        sections.push(operation);
    }

    ReviewSummary { sections }
}

struct ActiveView<'a> {
    record: &'a FormRecord,
    active: &'a ActiveFields,
}

impl ActiveView<'_> {
    fn value(&self, path: &str) -> Option<&Value> {
        if !self.active.contains(path) {
            return None;
        }
        self.record.get(path).filter(|value| !is_blank(value))
    }

    fn text(&self, path: &str) -> Option<String> {
        self.value(path).map(display_scalar)
    }

    fn coded<E: CodedEnum>(&self, path: &str) -> Option<String> {
        self.value(path).map(|value| match value.as_str() {
            Some(code) => label_for::<E>(code),
            None => display_scalar(value),
        })
    }

    fn number(&self, path: &str) -> Option<f64> {
        self.value(path).and_then(Value::as_f64)
    }

    fn flag(&self, path: &str) -> bool {
        self.value(path).and_then(Value::as_bool) == Some(true)
    }
}

fn is_blank(value: &Value) -> bool {
    value.as_str().is_some_and(|text| text.trim().is_empty())
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn line(label: &'static str, value: Option<String>) -> SummaryLine {
    SummaryLine { label, value: value.unwrap_or_else(|| NOT_PROVIDED.to_string()) }
}

fn section(step: StepId, key: &'static str, title: &'static str, lines: Vec<SummaryLine>) -> SummarySection {
    SummarySection { step, key, title, lines }
}

fn with_detail(base: Option<String>, detail: Option<String>) -> Option<String> {
    match (base, detail) {
        (Some(base), Some(detail)) => Some(format!("{base} ({detail})")),
        (base, _) => base,
    }
}

fn customer_section(view: &ActiveView<'_>) -> SummarySection {
    let customer_type = with_detail(
        view.coded::<CustomerType>(path::CUSTOMER_TYPE),
        view.text(path::CUSTOMER_TYPE_OTHER),
    );

    section(
        StepId::Customer,
        "customer",
        "Customer",
        vec![
            line("Customer type", customer_type),
            line("Name", view.text(path::CUSTOMER_NAME)),
            line("Email", view.text(path::CUSTOMER_EMAIL)),
            line("Phone", view.text(path::CUSTOMER_PHONE)),
        ],
    )
}

fn space_section(view: &ActiveView<'_>) -> SummarySection {
    let space_type =
        with_detail(view.coded::<SpaceType>(path::SPACE_TYPE), view.text(path::SPACE_TYPE_OTHER));

    let dimensions = match (
        view.text(path::SPACE_WIDTH),
        view.text(path::SPACE_LENGTH),
        view.text(path::SPACE_HEIGHT),
    ) {
        (Some(width), Some(length), Some(height)) => {
            Some(format!("{width} m x {length} m x {height} m"))
        }
        _ => None,
    };

    let floor_area = match (view.number(path::SPACE_WIDTH), view.number(path::SPACE_LENGTH)) {
        (Some(width), Some(length)) => Some(format!("{:.1} m2", width * length)),
        _ => None,
    };

    section(
        StepId::SpaceCrops,
        "space",
        "Space",
        vec![
            line("Space type", space_type),
            line("Dimensions", dimensions),
            line("Floor area", floor_area),
        ],
    )
}

fn crops_section(view: &ActiveView<'_>) -> SummarySection {
    let selected = view
        .value(path::SELECTED_CROPS)
        .and_then(Value::as_array)
        .filter(|crops| !crops.is_empty())
        .map(|crops| {
            crops
                .iter()
                .map(|crop| match crop.as_str() {
                    Some(code) => label_for::<Crop>(code),
                    None => display_scalar(crop),
                })
                .collect::<Vec<_>>()
                .join(", ")
        });

    let mut lines = vec![line("Crops", selected)];
    if let Some(other) = view.text(path::CROP_OTHER) {
        lines.push(line("Other crop", Some(other)));
    }
    if let Some(primary) = view.coded::<Crop>(path::PRIMARY_CROP) {
        lines.push(line("Primary crop", Some(primary)));
    }

    section(StepId::SpaceCrops, "crops", "Crops", lines)
}

fn system_section(view: &ActiveView<'_>) -> SummarySection {
    let system_type = with_detail(
        view.coded::<SystemType>(path::SYSTEM_TYPE),
        view.text(path::FIXED_RACK_TIERS).map(|tiers| format!("{tiers} tiers")),
    );
    let env_control = if view.flag(path::ENV_CONTROL_INCLUDED) { "Included" } else { "Not included" };

    let mut lines = vec![
        line("System type", system_type),
        line("Hydroponics", view.coded::<HydroponicType>(path::HYDROPONIC_TYPE)),
        line("Environment control", Some(env_control.to_string())),
    ];
    if let Some(hvac) = options(view, &HVAC_OPTIONS) {
        lines.push(line("HVAC", Some(hvac)));
    }
    if let Some(nutrient) = options(view, &NUTRIENT_OPTIONS) {
        lines.push(line("Nutrient dosing", Some(nutrient)));
    }
    let horsepower = view.text(path::CHILLER_HP).map(|hp| format!("{hp} HP"));
    let chiller = match view.coded::<ChillerMode>(path::CHILLER_MODE) {
        Some(mode) => with_detail(Some(mode), horsepower),
        None => horsepower,
    };
    if let Some(chiller) = chiller {
        lines.push(line("Chiller", Some(chiller)));
    }

    section(StepId::System, "system", "System", lines)
}

const HVAC_OPTIONS: [(&str, &str); 5] = [
    (path::HVAC_AC, "Air conditioner"),
    (path::HVAC_HEAT_EXCHANGER, "Heat exchanger"),
    (path::HVAC_CIRCULATION_FAN, "Circulation fan"),
    (path::HVAC_AIR_CIRCULATOR, "Air circulator"),
    (path::HVAC_USE_DEFAULT, "Recommended set"),
];

const NUTRIENT_OPTIONS: [(&str, &str); 5] = [
    (path::NUTRIENT_AUTO_AB, "Auto A/B"),
    (path::NUTRIENT_AUTO_C, "Auto C"),
    (path::NUTRIENT_AUTO_EC, "Auto EC"),
    (path::NUTRIENT_AUTO_PH, "Auto pH"),
    (path::NUTRIENT_USE_DEFAULT, "Recommended set"),
];

/// Labels of the switched-on options, or `None` when none are on.
fn options(view: &ActiveView<'_>, table: &[(&str, &'static str)]) -> Option<String> {
    let enabled: Vec<_> =
        table.iter().filter(|(path, _)| view.flag(path)).map(|(_, label)| *label).collect();
    (!enabled.is_empty()).then(|| enabled.join(", "))
}

fn money(value: String) -> String {
    format!("{value} {MONEY_UNIT}")
}

fn operation_section(view: &ActiveView<'_>) -> Option<SummarySection> {
    if !fields_owned_by(StepId::Operation).iter().any(|path| view.value(path).is_some()) {
        return None;
    }

    let mut lines = Vec::new();
    if let Some(count) = view.text(path::STAFF_COUNT) {
        lines.push(line("Staff", Some(format!("{count} people"))));
    }
    if let Some(salary) = view.text(path::MONTHLY_SALARY_PER_STAFF) {
        lines.push(line("Salary per staff", Some(format!("{} per month", money(salary)))));
    }
    if view.value(path::IS_RENTED).is_some() {
        if view.flag(path::IS_RENTED) {
            lines.push(line("Monthly rent", view.text(path::MONTHLY_RENT).map(money)));
        } else {
            lines.push(line("Premises", Some("Owned".to_string())));
        }
    }
    if view.value(path::USE_LOAN).is_some() {
        if view.flag(path::USE_LOAN) {
            let mut terms = Vec::new();
            if let Some(rate) = view.text(path::LOAN_INTEREST_RATE) {
                terms.push(format!("{rate}% per year"));
            }
            if let Some(years) = view.text(path::LOAN_TERM_YEARS) {
                terms.push(format!("{years} years"));
            }
            if let Some(grace) = view.text(path::GRACE_PERIOD_YEARS) {
                terms.push(format!("{grace}-year grace period"));
            }
            let amount =
                view.text(path::LOAN_AMOUNT).map(money).unwrap_or_else(|| NOT_PROVIDED.to_string());
            let detail = (!terms.is_empty()).then(|| terms.join(", "));
            lines.push(line("Loan", with_detail(Some(amount), detail)));
        } else {
            lines.push(line("Loan", Some("Not used".to_string())));
        }
    }
    if let Some(revenue) = view.text(path::TARGET_MONTHLY_REVENUE) {
        lines.push(line("Target monthly revenue", Some(money(revenue))));
    }
    if let Some(budget) = view.coded::<MarketingBudget>(path::MARKETING_BUDGET) {
        lines.push(line("Marketing budget", Some(budget)));
    }

    Some(section(StepId::Operation, "operation", "Operation & finance", lines))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{review_summary, NOT_PROVIDED};
    use crate::schema::catalog::{default_record, path, FormDefinition};

    fn form() -> FormDefinition {
        FormDefinition::standard().expect("standard form")
    }

    #[test]
    fn defaults_render_known_labels_and_placeholders() {
        let summary = review_summary(&form(), &default_record());

        let keys: Vec<_> = summary.sections.iter().map(|section| section.key).collect();
        assert_eq!(keys, vec!["customer", "space", "crops", "system"]);

        let customer = summary.section("customer").expect("customer section");
        assert_eq!(customer.value_of("Customer type"), Some("Startup / smart-farm venture"));
        assert_eq!(customer.value_of("Name"), Some(NOT_PROVIDED));

        let space = summary.section("space").expect("space section");
        assert_eq!(space.value_of("Dimensions"), Some("5 m x 4 m x 2.5 m"));
        assert_eq!(space.value_of("Floor area"), Some("20.0 m2"));

        let system = summary.section("system").expect("system section");
        assert_eq!(system.value_of("Environment control"), Some("Included"));
    }

    #[test]
    fn unknown_codes_are_shown_verbatim() {
        let mut record = default_record();
        record.set(path::SELECTED_CROPS, json!(["herb", "saffron"]));

        let summary = review_summary(&form(), &record);
        let crops = summary.section("crops").expect("crops section");
        assert_eq!(crops.value_of("Crops"), Some("Herbs, saffron"));
    }

    #[test]
    fn dormant_values_are_left_out() {
        let mut record = default_record();
        record.set(path::CUSTOMER_TYPE_OTHER, json!("Community garden"));
        record.set(path::FIXED_RACK_TIERS, json!(6));

        let summary = review_summary(&form(), &record);
        let customer = summary.section("customer").expect("customer section");
        assert_eq!(customer.value_of("Customer type"), Some("Startup / smart-farm venture"));
        let system = summary.section("system").expect("system section");
        assert_eq!(system.value_of("System type"), Some("Smart Garden, 4 tiers"));

        record.set(path::CUSTOMER_TYPE, json!("other"));
        record.set(path::SYSTEM_TYPE, json!("fixed_rack_custom"));
        let summary = review_summary(&form(), &record);
        let customer = summary.section("customer").expect("customer section");
        assert_eq!(customer.value_of("Customer type"), Some("Other (Community garden)"));
        let system = summary.section("system").expect("system section");
        assert_eq!(system.value_of("System type"), Some("Fixed rack, custom height (6 tiers)"));
    }

    #[test]
    fn operation_section_appears_once_it_has_content() {
        let mut record = default_record();
        assert!(review_summary(&form(), &record).section("operation").is_none());

        record.set(path::MARKETING_BUDGET, json!("unknown"));
        let summary = review_summary(&form(), &record);
        let operation = summary.section("operation").expect("budget alone is content");
        assert_eq!(operation.value_of("Marketing budget"), Some("Undecided"));

        record.set(path::USE_LOAN, json!(true));
        record.set(path::LOAN_AMOUNT, json!(5000));
        record.set(path::LOAN_INTEREST_RATE, json!(4.5));
        record.set(path::LOAN_TERM_YEARS, json!(5));

        let summary = review_summary(&form(), &record);
        let operation = summary.section("operation").expect("operation section");
        assert_eq!(operation.value_of("Loan"), Some("5000 x10k KRW (4.5% per year, 5 years)"));
        assert_eq!(operation.value_of("Staff"), None);
    }

    #[test]
    fn active_equipment_and_operating_details_are_listed() {
        let mut record = default_record();
        record.set(path::HVAC_AC, json!(true));
        record.set(path::HVAC_CIRCULATION_FAN, json!(false));
        record.set(path::NUTRIENT_AUTO_PH, json!(true));
        record.set(path::CHILLER_MODE, json!("manual"));
        record.set(path::CHILLER_HP, json!(2));
        record.set(path::MONTHLY_SALARY_PER_STAFF, json!(300));
        record.set(path::MARKETING_BUDGET, json!("small_20_50"));

        let summary = review_summary(&form(), &record);
        let system = summary.section("system").expect("system section");
        assert_eq!(system.value_of("HVAC"), Some("Air conditioner"));
        assert_eq!(system.value_of("Nutrient dosing"), Some("Auto pH"));
        assert_eq!(system.value_of("Chiller"), Some("Manual (2 HP)"));

        let operation = summary.section("operation").expect("operation section");
        assert_eq!(operation.value_of("Salary per staff"), Some("300 x10k KRW per month"));
        assert_eq!(operation.value_of("Marketing budget"), Some("20M to 50M KRW"));
        assert_eq!(operation.value_of("Loan"), None);

        record.set(path::ENV_CONTROL_INCLUDED, json!(false));
        let summary = review_summary(&form(), &record);
        let system = summary.section("system").expect("system section");
        assert_eq!(system.value_of("HVAC"), None);
        assert_eq!(system.value_of("Chiller"), None);
    }

    #[test]
    fn rented_premises_without_rent_show_a_placeholder() {
        let mut record = default_record();
        record.set(path::IS_RENTED, json!(true));

        let summary = review_summary(&form(), &record);
        let operation = summary.section("operation").expect("operation section");
        assert_eq!(operation.value_of("Monthly rent"), Some(NOT_PROVIDED));

        record.set(path::IS_RENTED, json!(false));
        record.set(path::MONTHLY_RENT, json!(150));
        let summary = review_summary(&form(), &record);
        let operation = summary.section("operation").expect("operation section");
        assert_eq!(operation.value_of("Premises"), Some("Owned"));
        assert_eq!(operation.value_of("Monthly rent"), None);
    }
}
