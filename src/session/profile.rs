use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role carried in the token's `role` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "staff" => Ok(Role::Staff),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Staff title; decides which approval stage a staff member can act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Designation {
    Tutor,
    ProgramCoordinator,
    Hod,
    Dean,
    Principal,
    #[serde(other)]
    Other,
}

impl Designation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Designation::Tutor => "TUTOR",
            Designation::ProgramCoordinator => "PROGRAM_COORDINATOR",
            Designation::Hod => "HOD",
            Designation::Dean => "DEAN",
            Designation::Principal => "PRINCIPAL",
            Designation::Other => "OTHER",
        }
    }

    /// Approval stage this designation reviews, if any.
    /// Principals see the dean queue.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Designation::Tutor => Some("tutor"),
            Designation::Hod => Some("hod"),
            Designation::Dean | Designation::Principal => Some("dean"),
            Designation::ProgramCoordinator | Designation::Other => None,
        }
    }
}

impl fmt::Display for Designation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Designation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "TUTOR" => Ok(Designation::Tutor),
            "PROGRAM_COORDINATOR" => Ok(Designation::ProgramCoordinator),
            "HOD" => Ok(Designation::Hod),
            "DEAN" => Ok(Designation::Dean),
            "PRINCIPAL" => Ok(Designation::Principal),
            "OTHER" => Ok(Designation::Other),
            other => Err(format!("unknown designation '{}'", other)),
        }
    }
}

/// Role-specific part of the user profile, tagged by `role`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Student {
        #[serde(default)]
        student_class: Option<String>,
        #[serde(default)]
        department: Option<String>,
    },
    Staff {
        #[serde(default)]
        designation: Option<Designation>,
        #[serde(default)]
        student_class: Option<String>,
        #[serde(default)]
        department: Option<String>,
    },
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Student { .. } => Role::Student,
            Profile::Staff { .. } => Role::Staff,
        }
    }

    pub fn designation(&self) -> Option<Designation> {
        match self {
            Profile::Staff { designation, .. } => *designation,
            Profile::Student { .. } => None,
        }
    }

    pub fn student_class(&self) -> Option<&str> {
        match self {
            Profile::Student { student_class, .. } | Profile::Staff { student_class, .. } => {
                student_class.as_deref()
            }
        }
    }

    pub fn department(&self) -> Option<&str> {
        match self {
            Profile::Student { department, .. } | Profile::Staff { department, .. } => {
                department.as_deref()
            }
        }
    }
}

/// User object as returned by login and signup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(flatten)]
    pub profile: Profile,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}
