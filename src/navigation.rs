//! Sidebar menu of the admin dashboard.

use serde::Serialize;

/// One sidebar row. Leaves without a route are placeholders for pages that
/// are not routed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NavItem {
    Heading {
        heading: &'static str,
    },
    Link {
        title: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<NavIcon>,
        #[serde(skip_serializing_if = "Option::is_none")]
        to: Option<&'static str>,
        #[serde(flatten)]
        badge: Option<Badge>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        children: Vec<NavItem>,
    },
}

/// Icon props handed to the menu renderer: `{ "icon": "tabler-truck" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavIcon {
    pub icon: &'static str,
}

/// Serialized inline on the item as `badgeContent` / `badgeClass`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    #[serde(rename = "badgeContent")]
    pub content: &'static str,
    #[serde(rename = "badgeClass")]
    pub class: &'static str,
}

impl NavItem {
    fn group(title: &'static str, icon: &'static str, children: Vec<NavItem>) -> Self {
        Self::Link {
            title,
            icon: Some(NavIcon { icon }),
            to: None,
            badge: None,
            children,
        }
    }

    fn leaf(title: &'static str, to: Option<&'static str>) -> Self {
        Self::Link {
            title,
            icon: None,
            to,
            badge: None,
            children: Vec::new(),
        }
    }

    pub fn title(&self) -> Option<&'static str> {
        match self {
            Self::Heading { .. } => None,
            Self::Link { title, .. } => Some(*title),
        }
    }

    pub fn children(&self) -> &[NavItem] {
        match self {
            Self::Heading { .. } => &[],
            Self::Link { children, .. } => children.as_slice(),
        }
    }

    /// Route names reachable from this item and its descendants.
    pub fn routes(&self) -> Vec<&'static str> {
        let own = match self {
            Self::Link { to: Some(to), .. } => Some(*to),
            _ => None,
        };
        own.into_iter()
            .chain(self.children().iter().flat_map(NavItem::routes))
            .collect()
    }
}

pub fn menu() -> Vec<NavItem> {
    let mut dashboards = NavItem::group(
        "Dashboards",
        "tabler-smart-home",
        vec![NavItem::leaf("Analytics", None)],
    );
    if let NavItem::Link { badge, .. } = &mut dashboards {
        *badge = Some(Badge {
            content: "5",
            class: "bg-error",
        });
    }

    vec![
        dashboards,
        NavItem::Heading { heading: "App" },
        NavItem::group(
            "Couriers",
            "tabler-users",
            vec![
                NavItem::leaf("List", Some("couriers-list")),
                NavItem::leaf("Add", None),
            ],
        ),
        NavItem::group(
            "Delivery",
            "tabler-truck",
            vec![
                NavItem::leaf("Dashboard", Some("delivery-dashboard")),
                NavItem::leaf("List", None),
                NavItem::leaf("Add", None),
            ],
        ),
        NavItem::group(
            "Partners",
            "tabler-users",
            vec![NavItem::leaf("List", None), NavItem::leaf("Add", None)],
        ),
        NavItem::group("Reports", "tabler-chart-bar", Vec::new()),
        NavItem::group(
            "Roles & Permissions",
            "tabler-lock",
            vec![
                NavItem::leaf("Roles", Some("role")),
                NavItem::leaf("Permissions", None),
            ],
        ),
        NavItem::group(
            "Settings",
            "tabler-settings",
            vec![NavItem::leaf("List", None), NavItem::leaf("Add", None)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_order() {
        let titles: Vec<_> = menu().iter().map(NavItem::title).collect();
        assert_eq!(
            titles,
            vec![
                Some("Dashboards"),
                None,
                Some("Couriers"),
                Some("Delivery"),
                Some("Partners"),
                Some("Reports"),
                Some("Roles & Permissions"),
                Some("Settings"),
            ]
        );
    }

    #[test]
    fn only_routed_leaves_expose_routes() {
        let routes: Vec<_> = menu().iter().flat_map(NavItem::routes).collect();
        assert_eq!(routes, vec!["couriers-list", "delivery-dashboard", "role"]);
    }

    #[test]
    fn serializes_in_the_menu_renderer_shape() {
        let json = serde_json::to_value(menu()).unwrap();
        assert_eq!(json[0]["icon"], serde_json::json!({"icon": "tabler-smart-home"}));
        assert_eq!(json[0]["badgeContent"], "5");
        assert_eq!(json[0]["badgeClass"], "bg-error");
        assert!(json[0].get("badge").is_none());
        assert!(json[2].get("badgeContent").is_none());
        assert!(json[2]["children"][0].get("icon").is_none());
        assert_eq!(json[1], serde_json::json!({"heading": "App"}));
        assert!(json[5].get("children").is_none());
        assert_eq!(json[3]["children"][0]["to"], "delivery-dashboard");
    }
}
