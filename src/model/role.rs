use super::user::{UserInfo, UserType};

/// Fields exposed for every row of the user list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    DisplayName,
    Username,
    Name,
    Type,
    Uid,
    Current,
    Placeholder,
}

impl Role {
    pub fn all() -> &'static [Self] {
        &[
            Self::DisplayName,
            Self::Username,
            Self::Name,
            Self::Type,
            Self::Uid,
            Self::Current,
            Self::Placeholder,
        ]
    }

    pub fn role_name(&self) -> &'static str {
        match self {
            Role::DisplayName => "displayName",
            Role::Username => "username",
            Role::Name => "name",
            Role::Type => "type",
            Role::Uid => "uid",
            Role::Current => "current",
            Role::Placeholder => "placeholder",
        }
    }

    pub fn from_role_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|role| role.role_name() == name)
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, Role::Name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoleValue {
    Text(String),
    Type(UserType),
    Uid(Option<u32>),
    Bool(bool),
}

impl RoleValue {
    pub fn of(user: &UserInfo, role: Role) -> Self {
        match role {
            Role::DisplayName => RoleValue::Text(user.display_name().to_string()),
            Role::Username => RoleValue::Text(user.username().to_string()),
            Role::Name => RoleValue::Text(user.name().to_string()),
            Role::Type => RoleValue::Type(user.user_type()),
            Role::Uid => RoleValue::Uid(user.uid()),
            Role::Current => RoleValue::Bool(user.current()),
            Role::Placeholder => RoleValue::Bool(!user.is_valid()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RoleValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleValue::Text(text) => f.write_str(text),
            RoleValue::Type(user_type) => f.write_str(user_type.as_str()),
            RoleValue::Uid(Some(uid)) => write!(f, "{uid}"),
            RoleValue::Uid(None) => f.write_str("-"),
            RoleValue::Bool(value) => write!(f, "{value}"),
        }
    }
}
