use tornwatch_common::models::{
    Notification, NotifyCondition, PrimaryStatusSnapshot, RaceSnapshot,
};

/// Builds the title and body for `condition`, pulling names from the cached snapshots.
pub fn render_notification(
    condition: NotifyCondition,
    primary: Option<&PrimaryStatusSnapshot>,
    race: Option<&RaceSnapshot>,
) -> Notification {
    let race_title = race
        .and_then(|r| r.latest())
        .map(|r| r.title.as_str())
        .filter(|t| !t.is_empty());

    let (title, body) = match condition {
        NotifyCondition::EnergyFull => ("Energy full".to_string(), "Your energy bar is full.".to_string()),
        NotifyCondition::NerveFull => ("Nerve full".to_string(), "Your nerve bar is full.".to_string()),
        NotifyCondition::HappinessFull => {
            ("Happiness full".to_string(), "Your happiness bar is full.".to_string())
        }
        NotifyCondition::BoosterReady => {
            ("Booster ready".to_string(), "Your booster cooldown has expired.".to_string())
        }
        NotifyCondition::MedicalReady => {
            ("Medical ready".to_string(), "Your medical cooldown has expired.".to_string())
        }
        NotifyCondition::DrugReady => {
            ("Drug ready".to_string(), "Your drug cooldown has expired.".to_string())
        }
        NotifyCondition::TravelArrived => {
            let body = match primary.and_then(|p| p.travel_destination()) {
                Some(destination) => format!("You have arrived in {}.", destination),
                None => "You have arrived.".to_string(),
            };
            ("Arrived!".to_string(), body)
        }
        NotifyCondition::RaceStarted => {
            let body = match race_title {
                Some(title) => format!("{} has started.", title),
                None => "Your race has started.".to_string(),
            };
            ("Race started".to_string(), body)
        }
        NotifyCondition::RaceFinished => {
            let body = match race_title {
                Some(title) => format!("{} has finished.", title),
                None => "Your race has finished.".to_string(),
            };
            ("Race finished".to_string(), body)
        }
        NotifyCondition::NewDayApproaching => (
            "New day soon".to_string(),
            "Less than an hour until the UTC day resets.".to_string(),
        ),
        NotifyCondition::NewDayReached => {
            ("New day".to_string(), "The UTC day has reset.".to_string())
        }
        NotifyCondition::RefillReminder => {
            let body = match primary.and_then(|p| p.refills.as_ref()) {
                Some(r) if !r.energy_refill_used && !r.nerve_refill_used => {
                    "Energy and nerve refills are still unused today.".to_string()
                }
                Some(r) if !r.energy_refill_used => "Your energy refill is still unused today.".to_string(),
                _ => "Your nerve refill is still unused today.".to_string(),
            };
            ("Refill reminder".to_string(), body)
        }
    };

    Notification { condition, title, body }
}
