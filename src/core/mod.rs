pub mod reconciler;

pub use reconciler::{
    classify_modifications, diff, ReconciliationResult, ResultSummary, TreeReconciler,
};
