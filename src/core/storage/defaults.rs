use super::document_store::{Document, DocumentKind};
use crate::core::alliance::{Alliance, AllianceLogs};
use crate::core::bookings::BookingsDocument;
use crate::core::guilds::GuildsDocument;
use crate::core::layout::ButtonLayout;
use crate::core::ministries::MinistriesDocument;
use crate::core::permissions::Permissions;
use crate::core::reminders::ReminderSettings;
use crate::core::schedule::ScheduleDocument;
use crate::core::users::UsersDocument;
use serde_json::Value;

/// The shape written for a document on first run.
pub fn default_shape(kind: DocumentKind) -> Result<Value, serde_json::Error> {
    match kind {
        DocumentKind::Users => shape::<UsersDocument>(),
        DocumentKind::Bookings => shape::<BookingsDocument>(),
        DocumentKind::Alliance => shape::<Alliance>(),
        DocumentKind::Permissions => shape::<Permissions>(),
        DocumentKind::Reminders => shape::<ReminderSettings>(),
        DocumentKind::AllianceLogs => shape::<AllianceLogs>(),
        DocumentKind::Ministries => shape::<MinistriesDocument>(),
        DocumentKind::Schedule => shape::<ScheduleDocument>(),
        DocumentKind::Guilds => shape::<GuildsDocument>(),
        DocumentKind::ButtonLayout => shape::<ButtonLayout>(),
    }
}

fn shape<D: Document>() -> Result<Value, serde_json::Error> {
    serde_json::to_value(D::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_an_object_shape() {
        for kind in DocumentKind::ALL {
            let value = default_shape(kind).unwrap();
            assert!(value.is_object(), "{kind} default should be a JSON object");
        }
    }

    #[test]
    fn test_bookings_default_has_all_resource_lists() {
        let value = default_shape(DocumentKind::Bookings).unwrap();
        for key in ["building", "research", "training"] {
            assert!(value[key].as_array().unwrap().is_empty());
        }
    }
}
