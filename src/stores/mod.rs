//! The typed store interfaces. Each store owns its own queries and
//! transaction boundaries; handlers and the grade aggregator never issue
//! ad hoc SQL against these tables.

pub mod assessment;
pub mod enrollment;
pub mod scheme;

use crate::catalog::Section;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "instructor" => Some(Role::Instructor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Per-request context for every mutating operation. The auth collaborator
/// vouches for (user_id, role); the engine only checks ownership. The
/// maintenance flag travels with the request rather than living in process
/// state, so the stores stay testable in isolation.
#[derive(Debug, Clone)]
pub struct OpContext {
    pub user_id: String,
    pub role: Role,
    pub maintenance_mode: bool,
}

impl OpContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            maintenance_mode: false,
        }
    }

    pub fn with_maintenance(mut self, on: bool) -> Self {
        self.maintenance_mode = on;
        self
    }

    pub(crate) fn guard_maintenance(&self) -> Result<(), EngineError> {
        if self.maintenance_mode {
            return Err(EngineError::Maintenance);
        }
        Ok(())
    }

    /// Section mutations (capacity, scheme, assessments) belong to the
    /// instructor of record; admin overrides.
    pub(crate) fn require_section_owner(&self, section: &Section) -> Result<(), EngineError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Instructor
                if section.instructor_id.as_deref() == Some(self.user_id.as_str()) =>
            {
                Ok(())
            }
            _ => Err(EngineError::Unauthorized),
        }
    }

    /// Enrollment rows are self-service: the acting user must be the
    /// affected student; admin overrides.
    pub(crate) fn require_self_or_admin(&self, student_id: &str) -> Result<(), EngineError> {
        if self.role == Role::Admin || self.user_id == student_id {
            Ok(())
        } else {
            Err(EngineError::Unauthorized)
        }
    }
}
