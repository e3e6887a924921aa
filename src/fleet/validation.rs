use super::NewTask;
use std::fmt;

/// Validation errors for create-task requests
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidId(i64),
    EmptyDescription,
    NonFiniteCoordinate(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidId(id) => write!(f, "mission id must be > 0, got {}", id),
            ValidationError::EmptyDescription => write!(f, "mission description is required"),
            ValidationError::NonFiniteCoordinate(field) => {
                write!(f, "coordinate '{}' must be a finite number", field)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validation rules:
/// - id must be positive
/// - description must not be blank
/// - all four coordinates must be finite
pub(super) fn validate_new_task(task: &NewTask) -> Result<(), ValidationError> {
    if task.id <= 0 {
        return Err(ValidationError::InvalidId(task.id));
    }
    if task.description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }

    let coordinates = [
        ("x1", task.start.x),
        ("y1", task.start.y),
        ("x2", task.end.x),
        ("y2", task.end.y),
    ];
    if let Some((field, _)) = coordinates.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ValidationError::NonFiniteCoordinate(*field));
    }

    Ok(())
}
