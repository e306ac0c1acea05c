use crate::{
    models::CapturedItem,
    settings::{GoalRoute, GoalSettings},
};

/// Decides which goal a committed item counts toward.
///
/// Rules are checked in order; a rule matches when its keyword occurs anywhere
/// in the item's defect type, ignoring case. Items matching no rule, and items
/// without analysis, count toward the default goal.
#[derive(Debug, Clone)]
pub struct GoalRouter {
    routes: Vec<GoalRoute>,
    default_goal_id: String,
}

impl GoalRouter {
    pub fn new(routes: Vec<GoalRoute>, default_goal_id: impl Into<String>) -> Self {
        let routes = routes
            .into_iter()
            .filter(|route| !route.keyword.trim().is_empty())
            .map(|route| GoalRoute {
                keyword: route.keyword.to_lowercase(),
                goal_id: route.goal_id,
            })
            .collect();

        Self {
            routes,
            default_goal_id: default_goal_id.into(),
        }
    }

    pub fn from_settings(settings: &GoalSettings) -> Self {
        Self::new(settings.routes.clone(), settings.default_goal_id.clone())
    }

    pub fn route_defect(&self, defect_type: &str) -> &str {
        let needle = defect_type.to_lowercase();
        self.routes
            .iter()
            .find(|route| needle.contains(&route.keyword))
            .map(|route| route.goal_id.as_str())
            .unwrap_or(&self.default_goal_id)
    }

    pub fn route(&self, item: &CapturedItem) -> &str {
        match item.defect_type() {
            Some(defect_type) => self.route_defect(defect_type),
            None => &self.default_goal_id,
        }
    }
}

impl Default for GoalRouter {
    fn default() -> Self {
        Self::from_settings(&GoalSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{GENERAL_GOAL_ID, RUST_GOAL_ID};

    #[test]
    fn default_rules_split_rust_from_everything_else() {
        let router = GoalRouter::default();
        assert_eq!(router.route_defect("Surface Rust"), RUST_GOAL_ID);
        assert_eq!(router.route_defect("RUSTED bolt"), RUST_GOAL_ID);
        assert_eq!(router.route_defect("Crack"), GENERAL_GOAL_ID);
        assert_eq!(router.route_defect("None"), GENERAL_GOAL_ID);
    }

    #[test]
    fn first_matching_rule_wins() {
        let router = GoalRouter::new(
            vec![
                GoalRoute {
                    keyword: "Crack".into(),
                    goal_id: "cracks".into(),
                },
                GoalRoute {
                    keyword: "hairline".into(),
                    goal_id: "hairlines".into(),
                },
                GoalRoute {
                    keyword: "  ".into(),
                    goal_id: "never".into(),
                },
            ],
            "other",
        );
        assert_eq!(router.route_defect("Hairline crack"), "cracks");
        assert_eq!(router.route_defect("Dent"), "other");
    }
}
