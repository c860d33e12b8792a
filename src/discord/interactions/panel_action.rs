// Typed panel actions and the custom-id table that produces them.
//
// Every button and modal the bot sends carries one of these ids. Ids are
// matched by prefix; the remainder is the payload. Ids without a payload
// must match exactly.

use crate::core::bookings::ResourceType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    /// `book:<type>`: open the booking form.
    OpenBooking(ResourceType),
    /// `bookings:mine`
    MyBookings,
    /// `booking:cancel:<id>`
    CancelBooking(String),
    /// `settings:notifications`
    ToggleNotifications,
    /// `settings:language`: open the language form.
    OpenLanguage,
    /// `schedule:view`
    ViewSchedule,
    /// `modal:book:<type>`: booking form submitted.
    SubmitBooking(ResourceType),
    /// `modal:language`: language form submitted.
    SubmitLanguage,
}

type Parser = fn(&str) -> Option<PanelAction>;

/// Longest prefixes first where one prefix could shadow another.
static ROUTES: &[(&str, Parser)] = &[
    ("modal:book:", parse_submit_booking),
    ("modal:language", parse_submit_language),
    ("booking:cancel:", parse_cancel),
    ("bookings:mine", parse_my_bookings),
    ("book:", parse_open_booking),
    ("settings:notifications", parse_notifications),
    ("settings:language", parse_language),
    ("schedule:view", parse_schedule),
];

fn parse_open_booking(rest: &str) -> Option<PanelAction> {
    ResourceType::parse(rest).map(PanelAction::OpenBooking)
}

fn parse_submit_booking(rest: &str) -> Option<PanelAction> {
    ResourceType::parse(rest).map(PanelAction::SubmitBooking)
}

fn parse_cancel(rest: &str) -> Option<PanelAction> {
    let id = rest.trim();
    (!id.is_empty() && !id.contains(':')).then(|| PanelAction::CancelBooking(id.to_string()))
}

fn exact(rest: &str, action: PanelAction) -> Option<PanelAction> {
    rest.is_empty().then_some(action)
}

fn parse_my_bookings(rest: &str) -> Option<PanelAction> {
    exact(rest, PanelAction::MyBookings)
}

fn parse_notifications(rest: &str) -> Option<PanelAction> {
    exact(rest, PanelAction::ToggleNotifications)
}

fn parse_language(rest: &str) -> Option<PanelAction> {
    exact(rest, PanelAction::OpenLanguage)
}

fn parse_schedule(rest: &str) -> Option<PanelAction> {
    exact(rest, PanelAction::ViewSchedule)
}

fn parse_submit_language(rest: &str) -> Option<PanelAction> {
    exact(rest, PanelAction::SubmitLanguage)
}

impl PanelAction {
    pub fn parse(custom_id: &str) -> Option<Self> {
        ROUTES.iter().find_map(|(prefix, parser)| {
            custom_id.strip_prefix(prefix).and_then(|rest| parser(rest))
        })
    }

    pub fn custom_id(&self) -> String {
        match self {
            PanelAction::OpenBooking(t) => format!("book:{}", t),
            PanelAction::MyBookings => "bookings:mine".to_string(),
            PanelAction::CancelBooking(id) => format!("booking:cancel:{}", id),
            PanelAction::ToggleNotifications => "settings:notifications".to_string(),
            PanelAction::OpenLanguage => "settings:language".to_string(),
            PanelAction::ViewSchedule => "schedule:view".to_string(),
            PanelAction::SubmitBooking(t) => format!("modal:book:{}", t),
            PanelAction::SubmitLanguage => "modal:language".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_panel_id_maps_to_its_action() {
        let cases = [
            ("book:building", PanelAction::OpenBooking(ResourceType::Building)),
            ("book:research", PanelAction::OpenBooking(ResourceType::Research)),
            ("book:training", PanelAction::OpenBooking(ResourceType::Training)),
            ("bookings:mine", PanelAction::MyBookings),
            ("booking:cancel:abc123", PanelAction::CancelBooking("abc123".to_string())),
            ("settings:notifications", PanelAction::ToggleNotifications),
            ("settings:language", PanelAction::OpenLanguage),
            ("schedule:view", PanelAction::ViewSchedule),
            ("modal:book:training", PanelAction::SubmitBooking(ResourceType::Training)),
            ("modal:language", PanelAction::SubmitLanguage),
        ];

        for (id, expected) in cases {
            assert_eq!(PanelAction::parse(id), Some(expected.clone()), "{id}");
            assert_eq!(expected.custom_id(), id);
        }
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        for id in [
            "",
            "book:",
            "book:farming",
            "bookings:mine:extra",
            "booking:cancel:",
            "booking:cancel:a:b",
            "settings:volume",
            "modal:book:",
            "modal:languages",
            "prev",
        ] {
            assert_eq!(PanelAction::parse(id), None, "{id}");
        }
    }
}
