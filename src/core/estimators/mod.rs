pub mod adwin;
pub mod gaussian_estimator;

pub use adwin::Adwin;
pub use gaussian_estimator::GaussianEstimator;
