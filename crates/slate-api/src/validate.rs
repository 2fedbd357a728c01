use slate_types::api::{
    BoardAccess, CreateWhiteboardRequest, FieldError, LoginRequest, RegisterRequest,
    RenameWhiteboardRequest, SaveSnapshotRequest,
};

/// Structural email check: one `@`, non-empty local part, dotted domain,
/// no whitespace. Deliverability is the mail server's problem.
pub fn is_valid_email(s: &str) -> bool {
    if s.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn field_error(field: &str, message: impl Into<String>) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.into(),
    }
}

pub fn validate_register(req: &RegisterRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_email(req.email.trim()) {
        errors.push(field_error("email", "Please provide a valid email address"));
    }
    if req.password.len() < 6 {
        errors.push(field_error(
            "password",
            "Password must be at least 6 characters long",
        ));
    }
    match req.full_name.as_deref().map(str::trim) {
        None | Some("") => errors.push(field_error("fullName", "Full name is required")),
        Some(name) if name.chars().count() > 100 => errors.push(field_error(
            "fullName",
            "Full name must not exceed 100 characters",
        )),
        Some(_) => {}
    }
    errors
}

pub fn validate_login(req: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_email(req.email.trim()) {
        errors.push(field_error("email", "Please provide a valid email address"));
    }
    if req.password.is_empty() {
        errors.push(field_error("password", "Password is required"));
    }
    errors
}

pub fn validate_create_whiteboard(req: &CreateWhiteboardRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    push_title_errors(&mut errors, &req.title);

    if req.board_access.is_none() {
        errors.push(field_error("boardAccess", "Board access type is required"));
    }

    if req.board_access == Some(BoardAccess::InviteSpecificUsers) {
        match req.invited_emails.as_deref() {
            Some(emails) if !emails.is_empty() => {
                for email in emails {
                    if !is_valid_email(email.trim()) {
                        errors.push(field_error(
                            "invitedEmails",
                            format!("'{}' is not a valid email address", email),
                        ));
                    }
                }
            }
            _ => errors.push(field_error(
                "invitedEmails",
                "Invited emails are required when access type is invite_specific_users",
            )),
        }
    }
    errors
}

pub fn validate_rename(req: &RenameWhiteboardRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    push_title_errors(&mut errors, &req.title);
    errors
}

/// Collaborator add/remove payloads carry a single email.
pub fn validate_collaborator_email(email: &str) -> Vec<FieldError> {
    if is_valid_email(email.trim()) {
        Vec::new()
    } else {
        vec![field_error("email", "Please provide a valid email address")]
    }
}

/// The canvas payload is opaque to the server beyond being a JSON object.
pub fn validate_snapshot(req: &SaveSnapshotRequest) -> Vec<FieldError> {
    if req.data.is_object() {
        Vec::new()
    } else {
        vec![field_error("data", "Snapshot data must be an object")]
    }
}

fn push_title_errors(errors: &mut Vec<FieldError>, title: &str) {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        errors.push(field_error("title", "Title is required"));
    } else if trimmed.chars().count() > 255 {
        errors.push(field_error("title", "Title must not exceed 255 characters"));
    }
}
