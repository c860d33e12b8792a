// Discord commands module.
// Each feature gets its own command file.

pub mod alliance;

pub mod ministries;

pub mod panel;

pub mod permissions;

pub mod remind;

pub mod schedule;

pub mod stats;

use crate::discord::{Data, Error};

/// Every slash command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        permissions::addadmin(),
        permissions::removeadmin(),
        permissions::setowner(),
        permissions::admins(),
        alliance::addmember(),
        alliance::removemember(),
        alliance::changerank(),
        alliance::setalliance(),
        alliance::setleader(),
        alliance::allianceinfo(),
        alliance::members(),
        alliance::update(),
        stats::stats(),
        stats::logs(),
        stats::refresh(),
        panel::panel(),
        panel::panelbutton(),
        ministries::ministries(),
        schedule::schedule(),
        remind::remind(),
    ]
}
