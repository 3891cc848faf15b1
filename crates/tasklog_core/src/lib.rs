pub mod completion;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod insights;
pub mod model;
pub mod notify;
pub mod reminder;
pub mod storage;
pub mod store;
pub mod task_api;

#[cfg(test)]
mod tests {
    use crate::error::AppError;

    #[test]
    fn app_error_exposes_code_and_message() {
        let err = AppError::invalid_input("missing title");
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(err.message(), "missing title");
        assert_eq!(err.to_string(), "invalid_input - missing title");
    }

    #[test]
    fn io_errors_convert_to_io_code() {
        let err: AppError = std::io::Error::other("disk full").into();
        assert_eq!(err.code(), "io_error");
        assert!(err.message().contains("disk full"));
    }
}
