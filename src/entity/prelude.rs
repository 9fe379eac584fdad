//! 预导入模块，方便使用

pub use super::audit_logs::{
    ActiveModel as AuditLogActiveModel, Entity as AuditLogs, Model as AuditLogModel,
};
pub use super::form_documents::{
    ActiveModel as FormDocumentActiveModel, Entity as FormDocuments, Model as FormDocumentModel,
};
pub use super::form_fields::{
    ActiveModel as FormFieldActiveModel, Entity as FormFields, Model as FormFieldModel,
};
pub use super::form_shares::{
    ActiveModel as FormShareActiveModel, Entity as FormShares, Model as FormShareModel,
};
pub use super::form_submissions::{
    ActiveModel as SubmissionActiveModel, Entity as FormSubmissions, Model as SubmissionModel,
};
pub use super::magic_link_tokens::{
    ActiveModel as MagicLinkTokenActiveModel, Entity as MagicLinkTokens,
    Model as MagicLinkTokenModel,
};
pub use super::parent_students::{
    ActiveModel as ParentStudentActiveModel, Entity as ParentStudents,
    Model as ParentStudentModel,
};
pub use super::permission_forms::{
    ActiveModel as FormActiveModel, Entity as PermissionForms, Model as FormModel,
};
pub use super::reminder_logs::{
    ActiveModel as ReminderLogActiveModel, Entity as ReminderLogs, Model as ReminderLogModel,
};
pub use super::schools::{ActiveModel as SchoolActiveModel, Entity as Schools, Model as SchoolModel};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
