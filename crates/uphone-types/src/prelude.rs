pub use crate::{
    id::Id,
    role::{ParseRoleError, Role},
    time::Timestamp,
};
