pub mod customer;
pub mod estimate;

pub use customer::{Customer, CustomerId, NewCustomer};
pub use estimate::{
    ChillerOptions, CropsSection, CustomerSection, Estimate, EstimateId, EstimateRecord,
    EstimateStatus, HvacOptions, NewEstimate, NutrientOptions, OperationSection, SpaceSection,
    SubmissionReceipt, SystemSection,
};
