pub const MEETINGS_CONFIG: &str = "MEETINGS_CONFIG";

pub const MEETINGS_HOST: &str = "MEETINGS_HOST";
pub const MEETINGS_PORT: &str = "MEETINGS_PORT";
pub const MEETINGS_CORS_ORIGIN: &str = "MEETINGS_CORS_ORIGIN";

pub const MEETINGS_DB_ADDRESS: &str = "MEETINGS_DB_ADDRESS";
pub const MEETINGS_DB_USER: &str = "MEETINGS_DB_USER";
pub const MEETINGS_DB_PSWD: &str = "MEETINGS_DB_PSWD";
pub const MEETINGS_DB_NAMESPACE: &str = "MEETINGS_DB_NAMESPACE";
pub const MEETINGS_DB_NAME: &str = "MEETINGS_DB_NAME";
