//! The persisted key surface.
//!
//! Every durable key the session subsystem reads, writes, or clears is named
//! here. Teardown removes exactly [`SESSION_KEYS`] - an explicit list, never a
//! blanket "clear everything", so unrelated persisted state (the user's
//! language preference in particular) survives logout.

/// Bearer access token.
pub const ACCESS_TOKEN: &str = "access_token";
/// Bearer refresh token.
pub const REFRESH_TOKEN: &str = "refresh_token";
/// Structured identity token (`header.payload.signature`).
pub const ID_TOKEN: &str = "id_token";
/// Legacy duplicate of the identity token; interceptors read this key first.
pub const JWT: &str = "jwt";

/// Epoch-millisecond string captured once at successful authentication.
pub const LOGIN_TIME: &str = "login_time";
/// Epoch-millisecond string bumped on user interaction and on every
/// successful validation pass.
pub const LAST_ACTIVITY: &str = "last_activity";

/// Identity snapshot: user id.
pub const USER_ID: &str = "user_id";
/// Identity snapshot: first name.
pub const USER_NAME: &str = "user_name";
/// Identity snapshot: last name.
pub const USER_LASTNAME: &str = "user_lastname";
/// Identity snapshot: email.
pub const USER_EMAIL: &str = "user_email";
/// Identity snapshot: backend customer id (same value as [`USER_ID`]).
pub const CUSTOMER_ID: &str = "customer_id";

/// Organization context: active partition key.
pub const PARTITION_KEY: &str = "partition_key";
/// Organization context: selected organization id.
pub const CURRENT_ORGANIZATION_ID: &str = "current_organization_id";
/// Organization context: selected organization display name.
pub const CURRENT_ORGANIZATION_NAME: &str = "current_organization_name";
/// Organization context: denormalized organization details blob.
pub const ORGANIZATION_DETAILS: &str = "organization_details";
/// Organization context: JSON array of the organizations available to the
/// user.
pub const AVAILABLE_ORGANIZATIONS: &str = "available_organizations";

/// Representative person display field.
pub const REPRESENTATIVE_PEOPLE_ID: &str = "representative_people_id";
/// Representative person display field.
pub const REPRESENTATIVE_PEOPLE_FULL_NAME: &str = "representative_people_full_name";
/// Representative person display field.
pub const REPRESENTATIVE_PEOPLE_FIRST_NAME: &str = "representative_people_first_name";
/// Representative person display field.
pub const REPRESENTATIVE_PEOPLE_LAST_NAME: &str = "representative_people_last_name";
/// Representative person display field.
pub const REPRESENTATIVE_PEOPLE_EMAIL: &str = "representative_people_email";
/// Representative person display field.
pub const REPRESENTATIVE_PEOPLE_CALLING_CODE: &str = "representative_people_calling_code";
/// Representative person display field.
pub const REPRESENTATIVE_PEOPLE_PHONE_NUMBER: &str = "representative_people_phone_number";

/// Company display field.
pub const COMPANY_BUSINESS_NAME: &str = "company_business_name";
/// Company display field.
pub const COMPANY_BUSINESS_TYPE: &str = "company_business_type";
/// Company display field.
pub const COMPANY_CALLING_CODE: &str = "company_calling_code";
/// Company display field.
pub const COMPANY_PHONE_NUMBER: &str = "company_phone_number";
/// Company display field.
pub const COMPANY_ADDRESS_LINE: &str = "company_address_line";

/// Transient fallback signal key: set to a timestamp and removed again right
/// after, so peers watching storage mutations observe a logout even when the
/// broadcast channel does not deliver.
pub const SESSION_LOGOUT: &str = "session_logout";

/// UI language preference. NOT owned by the session subsystem and NOT part of
/// [`SESSION_KEYS`]; it must survive logout.
pub const LANGUAGE: &str = "language";

/// Every key teardown removes, exhaustively.
pub const SESSION_KEYS: &[&str] = &[
    JWT,
    ID_TOKEN,
    REFRESH_TOKEN,
    ACCESS_TOKEN,
    USER_NAME,
    USER_LASTNAME,
    USER_ID,
    USER_EMAIL,
    CUSTOMER_ID,
    PARTITION_KEY,
    REPRESENTATIVE_PEOPLE_ID,
    REPRESENTATIVE_PEOPLE_FULL_NAME,
    REPRESENTATIVE_PEOPLE_FIRST_NAME,
    REPRESENTATIVE_PEOPLE_LAST_NAME,
    REPRESENTATIVE_PEOPLE_EMAIL,
    REPRESENTATIVE_PEOPLE_CALLING_CODE,
    REPRESENTATIVE_PEOPLE_PHONE_NUMBER,
    COMPANY_BUSINESS_NAME,
    COMPANY_BUSINESS_TYPE,
    COMPANY_CALLING_CODE,
    COMPANY_PHONE_NUMBER,
    COMPANY_ADDRESS_LINE,
    CURRENT_ORGANIZATION_ID,
    CURRENT_ORGANIZATION_NAME,
    ORGANIZATION_DETAILS,
    AVAILABLE_ORGANIZATIONS,
    LAST_ACTIVITY,
    LOGIN_TIME,
];
