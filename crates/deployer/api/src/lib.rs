pub mod error;
pub mod job;
pub mod request;

pub mod consts {
    pub const NAME: &str = "deployer-gateway";

    pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

    /// Set by the job controller on every pod it creates.
    pub const LABEL_JOB_NAME: &str = "job-name";
}
