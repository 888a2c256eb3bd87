//! Role and ownership rules for every guarded action

use auth::{Principal, Role};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    ViewTicket,
    CancelTicket,
    ListUsers,
    ListAllTickets,
}

/// What an action is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    None,
    Event { organizer_id: Uuid },
    Ticket { owner_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

/// Decide whether `principal` may perform `action` on `resource`
pub fn authorize(principal: &Principal, action: Action, resource: Resource) -> Decision {
    if principal.role == Role::Admin {
        return Decision::Allow;
    }

    match action {
        Action::CreateEvent if principal.role.can_organize() => Decision::Allow,
        Action::CreateEvent => Decision::Deny("Organizer access required"),

        Action::UpdateEvent => match resource {
            Resource::Event { organizer_id } if organizer_id == principal.id => Decision::Allow,
            _ => Decision::Deny("Not authorized to update this event"),
        },
        Action::DeleteEvent => match resource {
            Resource::Event { organizer_id } if organizer_id == principal.id => Decision::Allow,
            _ => Decision::Deny("Not authorized to delete this event"),
        },

        Action::ViewTicket => match resource {
            Resource::Ticket { owner_id } if owner_id == principal.id => Decision::Allow,
            _ => Decision::Deny("Not authorized to view this ticket"),
        },
        Action::CancelTicket => match resource {
            Resource::Ticket { owner_id } if owner_id == principal.id => Decision::Allow,
            _ => Decision::Deny("Not authorized to cancel this ticket"),
        },

        Action::ListUsers | Action::ListAllTickets => Decision::Deny("Admin access required"),
    }
}

/// [`authorize`], with a denial turned into a 403
pub fn ensure(principal: &Principal, action: Action, resource: Resource) -> ApiResult<()> {
    match authorize(principal, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(ApiError::forbidden(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: format!("{}@eventsphere.com", role),
            name: role.to_string(),
            role,
        }
    }

    #[test]
    fn test_only_organizers_and_admins_create_events() {
        assert_eq!(
            authorize(&principal(Role::User), Action::CreateEvent, Resource::None),
            Decision::Deny("Organizer access required")
        );
        assert_eq!(
            authorize(&principal(Role::Organizer), Action::CreateEvent, Resource::None),
            Decision::Allow
        );
        assert_eq!(
            authorize(&principal(Role::Admin), Action::CreateEvent, Resource::None),
            Decision::Allow
        );
    }

    #[test]
    fn test_event_changes_need_ownership() {
        let owner = principal(Role::Organizer);
        let other = principal(Role::Organizer);
        let event = Resource::Event {
            organizer_id: owner.id,
        };

        assert_eq!(authorize(&owner, Action::UpdateEvent, event), Decision::Allow);
        assert_eq!(authorize(&owner, Action::DeleteEvent, event), Decision::Allow);
        assert!(matches!(
            authorize(&other, Action::UpdateEvent, event),
            Decision::Deny(_)
        ));
        assert_eq!(
            authorize(&principal(Role::Admin), Action::DeleteEvent, event),
            Decision::Allow
        );
    }

    #[test]
    fn test_tickets_are_private_to_owner_and_admin() {
        let owner = principal(Role::User);
        let ticket = Resource::Ticket { owner_id: owner.id };

        assert_eq!(authorize(&owner, Action::CancelTicket, ticket), Decision::Allow);
        assert_eq!(
            authorize(&principal(Role::Organizer), Action::ViewTicket, ticket),
            Decision::Deny("Not authorized to view this ticket")
        );
        assert_eq!(
            authorize(&principal(Role::Admin), Action::ViewTicket, ticket),
            Decision::Allow
        );
    }

    #[test]
    fn test_listings_are_admin_only() {
        for role in [Role::User, Role::Organizer] {
            assert_eq!(
                authorize(&principal(role), Action::ListUsers, Resource::None),
                Decision::Deny("Admin access required")
            );
        }
        assert!(ensure(&principal(Role::Admin), Action::ListAllTickets, Resource::None).is_ok());
        assert!(matches!(
            ensure(&principal(Role::User), Action::ListAllTickets, Resource::None),
            Err(ApiError::Forbidden(_))
        ));
    }
}
