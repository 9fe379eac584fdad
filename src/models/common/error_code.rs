use serde::Serialize;

/// 业务错误码
///
/// 0 表示成功；1xxx 通用错误，2xxx 认证，3xxx 用户，4xxx 学校，
/// 5xxx 学生，6xxx 表单，7xxx 签署，8xxx 附件，9xxx 提醒。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    RateLimitExceeded = 1029,

    AuthFailed = 2000,
    MagicLinkInvalid = 2001,
    AccountDisabled = 2002,

    UserNotFound = 3000,
    UserEmailInvalid = 3001,
    UserEmailAlreadyExists = 3002,
    UserPasswordInvalid = 3003,
    UserCreationFailed = 3004,
    UserUpdateFailed = 3005,
    UserDeleteFailed = 3006,
    CanNotDeleteCurrentUser = 3007,
    UserSchoolRequired = 3008,

    SchoolNotFound = 4000,
    SchoolAlreadyExists = 4001,
    SchoolSlugInvalid = 4002,
    SchoolPermissionDenied = 4003,

    StudentNotFound = 5000,
    StudentInvalid = 5001,
    ParentLinkFailed = 5002,
    ImportFileParseFailed = 5003,
    ImportFileMissingColumn = 5004,
    ImportFileDataInvalid = 5005,

    FormNotFound = 6000,
    FormInvalid = 6001,
    FormPermissionDenied = 6002,
    FormInvalidState = 6003,
    FormReviewRequired = 6004,
    FormDeadlineInvalid = 6005,
    ReminderScheduleInvalid = 6006,
    FormShareInvalid = 6007,

    SubmissionNotFound = 7000,
    SubmissionAlreadyCompleted = 7001,
    SubmissionDeadlinePassed = 7002,
    SubmissionResponsesInvalid = 7003,
    SubmissionSignatureInvalid = 7004,
    SubmissionPermissionDenied = 7005,

    DocumentNotFound = 8000,
    FileUploadFailed = 8001,
    FileTypeNotAllowed = 8002,
    FileSizeExceeded = 8003,
    MultifileUploadNotAllowed = 8004,

    CronSecretInvalid = 9000,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_grouped_by_resource() {
        assert_eq!(ErrorCode::Success.as_i32(), 0);
        assert_eq!(ErrorCode::RateLimitExceeded.as_i32(), 1029);
        assert_eq!(ErrorCode::FormReviewRequired.as_i32() / 1000, 6);
        assert_eq!(ErrorCode::SubmissionDeadlinePassed.as_i32() / 1000, 7);
    }
}
