/*
 * Pure filtering policy deciding which exercises the current actor can see.
 * Two axes compose in a fixed order: the access filter (role and enabled-id
 * set) runs first, then the location filter. An exercise hidden by access
 * control can therefore never reappear through the location axis.
 *
 * Fails closed: while a user directory exists, an unresolved actor sees
 * nothing. Only a system with no access-control data at all (an empty
 * directory, the single-tenant case) defaults to full visibility.
 */
use super::models::{Exercise, Location, UserAccount};

/// Access axis: admins see the whole catalog, customers see their enabled
/// set. Store order is preserved.
pub fn visible_to_user<'a>(user: &UserAccount, all: &'a [Exercise]) -> Vec<&'a Exercise> {
    if user.is_admin() {
        return all.iter().collect();
    }
    all.iter()
        .filter(|ex| user.enabled_exercise_ids.contains(&ex.id))
        .collect()
}

/// Location axis: `None` and `Anywhere` are both "no filter"; otherwise
/// only exercises tagged with exactly the requested location pass.
pub fn visible_in_location<'a>(
    filter: Option<Location>,
    pool: Vec<&'a Exercise>,
) -> Vec<&'a Exercise> {
    match filter {
        None | Some(Location::Anywhere) => pool,
        Some(wanted) => pool.into_iter().filter(|ex| ex.location == wanted).collect(),
    }
}

/*
 * Full policy as the session controller consumes it: resolves the active
 * email against the directory, applies the access axis, then the location
 * axis.
 */
pub fn visible_exercises<'a>(
    directory: &[UserAccount],
    active_email: Option<&str>,
    location_filter: Option<Location>,
    all: &'a [Exercise],
) -> Vec<&'a Exercise> {
    let access_pass: Vec<&Exercise> = if directory.is_empty() {
        // Single-tenant: no access-control data exists anywhere.
        all.iter().collect()
    } else {
        match active_email.and_then(|email| directory.iter().find(|u| u.email == email)) {
            Some(user) => visible_to_user(user, all),
            None => {
                log::debug!(
                    "Visibility: No resolved actor ({active_email:?}); hiding all exercises."
                );
                Vec::new()
            }
        }
    };
    visible_in_location(location_filter, access_pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{ExerciseId, Role};
    use std::collections::HashSet;

    fn exercise(id: u64, location: Location) -> Exercise {
        Exercise {
            id: ExerciseId(id),
            title: format!("Exercise {id}"),
            instructions: "steps".to_string(),
            video_url: None,
            location,
            uses_rep_count: false,
        }
    }

    fn customer(email: &str, enabled: &[u64]) -> UserAccount {
        UserAccount {
            email: email.to_string(),
            name: "Customer".to_string(),
            role: Role::Customer,
            enabled_exercise_ids: enabled.iter().map(|id| ExerciseId(*id)).collect(),
        }
    }

    fn admin(email: &str) -> UserAccount {
        UserAccount {
            email: email.to_string(),
            name: "Admin".to_string(),
            role: Role::Admin,
            enabled_exercise_ids: HashSet::new(),
        }
    }

    #[test]
    fn test_admin_sees_everything_regardless_of_enabled_ids() {
        let catalog = vec![exercise(1, Location::Anywhere), exercise(2, Location::Indoor)];
        let user = admin("trainer@dogtrainer.com");
        let visible = visible_to_user(&user, &catalog);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_customer_sees_only_enabled_ids_in_store_order() {
        let catalog = vec![
            exercise(3, Location::Anywhere),
            exercise(2, Location::Anywhere),
            exercise(1, Location::Anywhere),
        ];
        let user = customer("sam@customer.com", &[1, 3]);
        let visible = visible_to_user(&user, &catalog);
        let ids: Vec<u64> = visible.iter().map(|ex| ex.id.0).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_location_filter_matches_exact_tag() {
        let catalog = vec![
            exercise(1, Location::Indoor),
            exercise(2, Location::Outdoor),
            exercise(3, Location::Anywhere),
        ];
        let pool: Vec<&Exercise> = catalog.iter().collect();

        let indoor = visible_in_location(Some(Location::Indoor), pool.clone());
        assert_eq!(indoor.len(), 1);
        assert_eq!(indoor[0].id, ExerciseId(1));

        let unfiltered = visible_in_location(Some(Location::Anywhere), pool.clone());
        assert_eq!(unfiltered.len(), 3);
        let unset = visible_in_location(None, pool);
        assert_eq!(unset.len(), 3);
    }

    #[test]
    fn test_access_hidden_never_reappears_via_location() {
        let catalog = vec![exercise(1, Location::Indoor), exercise(2, Location::Indoor)];
        let directory = vec![customer("sam@customer.com", &[2])];

        let visible = visible_exercises(
            &directory,
            Some("sam@customer.com"),
            Some(Location::Indoor),
            &catalog,
        );
        let ids: Vec<u64> = visible.iter().map(|ex| ex.id.0).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_unresolved_actor_fails_closed() {
        let catalog = vec![exercise(1, Location::Anywhere)];
        let directory = vec![customer("sam@customer.com", &[1])];

        assert!(visible_exercises(&directory, None, None, &catalog).is_empty());
        assert!(
            visible_exercises(&directory, Some("nobody@example.com"), None, &catalog).is_empty()
        );
    }

    #[test]
    fn test_empty_directory_is_single_tenant_and_fully_visible() {
        let catalog = vec![exercise(1, Location::Anywhere), exercise(2, Location::Outdoor)];
        let visible = visible_exercises(&[], None, None, &catalog);
        assert_eq!(visible.len(), 2);
    }
}
