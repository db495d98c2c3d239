//! Message formatting utilities for client display.

use crate::domain::{GeofenceTransition, MarkerState};
use crate::infrastructure::dto::websocket::{MessageBody, MessageKind};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the full roster after a room-users snapshot
    pub fn format_roster(usernames: &[String], current_username: &str) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str("Members:\n");

        if usernames.is_empty() {
            output.push_str("(No members)\n");
        } else {
            for username in usernames {
                let me_suffix = if username == current_username {
                    " (me)"
                } else {
                    ""
                };
                output.push_str(&format!("{}{}\n", username, me_suffix));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    pub fn format_peer_joined(username: &str) -> String {
        format!("\n+ {} joined the room\n", username)
    }

    pub fn format_peer_left(username: &str) -> String {
        format!("\n- {} left the room\n", username)
    }

    /// Format a peer position update; only unusual markers are announced
    pub fn format_peer_moved(username: &str, marker: MarkerState) -> Option<String> {
        match marker {
            MarkerState::Normal => None,
            MarkerState::Stationary => Some(format!("\n! {} is stationary\n", username)),
            MarkerState::Far => Some(format!("\n! {} is far from the group\n", username)),
            MarkerState::OutsideGeofence => {
                Some(format!("\n! {} is outside the geofence\n", username))
            }
        }
    }

    pub fn format_anomaly(username: &str, distance: u64, play_sound: bool) -> String {
        let bell = if play_sound { "\x07" } else { "" };
        format!(
            "{}\n!! ANOMALY: {} is {} m from the group center\n",
            bell, username, distance
        )
    }

    /// Format a relayed chat/SOS/anomaly message
    pub fn format_message(body: &MessageBody) -> String {
        match body.kind {
            MessageKind::Sos => format!(
                "\n\n------------------------------------------------------------\n\
                 !! SOS from @{}: {}\n\
                 sent at {}\n\
                 ------------------------------------------------------------\n",
                body.sender, body.content, body.timestamp
            ),
            _ => format!(
                "\n\n------------------------------------------------------------\n\
                 @{}: {}\n\
                 sent at {}\n\
                 ------------------------------------------------------------\n",
                body.sender, body.content, body.timestamp
            ),
        }
    }

    pub fn format_battery(username: &str, level: f64, charging: bool) -> String {
        let charge_note = if charging { ", charging" } else { "" };
        format!(
            "\n~ {} battery at {:.0}%{}\n",
            username,
            level * 100.0,
            charge_note
        )
    }

    pub fn format_fence_transition(transition: GeofenceTransition) -> String {
        match transition {
            GeofenceTransition::Exited => "\n! You left the geofence\n".to_string(),
            GeofenceTransition::Entered => "\n* You are back inside the geofence\n".to_string(),
        }
    }

    pub fn format_auto_sos() -> String {
        "\n!! You have not moved for a while; sending SOS to the group\n".to_string()
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_roster_with_empty_members() {
        // given (precondition):
        let usernames: Vec<String> = vec![];

        // when (operation):
        let result = MessageFormatter::format_roster(&usernames, "alice");

        // then (expected result):
        assert!(result.contains("Members:"));
        assert!(result.contains("(No members)"));
        assert!(result.contains("============================================================"));
    }

    #[test]
    fn test_format_roster_marks_the_current_user() {
        // given (precondition):
        let usernames = vec!["alice".to_string(), "bob".to_string()];

        // when (operation):
        let result = MessageFormatter::format_roster(&usernames, "alice");

        // then (expected result):
        assert!(result.contains("alice (me)"));
        assert!(result.contains("bob\n"));
        assert!(!result.contains("bob (me)"));
    }

    #[test]
    fn test_format_peer_moved_is_silent_for_normal_markers() {
        // given (precondition) / when (operation):
        let normal = MessageFormatter::format_peer_moved("bob", MarkerState::Normal);
        let far = MessageFormatter::format_peer_moved("bob", MarkerState::Far);

        // then (expected result):
        assert_eq!(normal, None);
        assert!(far.unwrap().contains("far from the group"));
    }

    #[test]
    fn test_format_anomaly_includes_bell_only_when_sound_is_due() {
        // given (precondition) / when (operation):
        let with_sound = MessageFormatter::format_anomaly("carol", 888, true);
        let without = MessageFormatter::format_anomaly("carol", 888, false);

        // then (expected result):
        assert!(with_sound.contains('\x07'));
        assert!(!without.contains('\x07'));
        assert!(with_sound.contains("888 m"));
    }

    #[test]
    fn test_format_sos_message_is_highlighted() {
        // given (precondition):
        let body = MessageBody {
            kind: MessageKind::Sos,
            content: "SOS Alert from alice".to_string(),
            sender: "alice".to_string(),
            timestamp: "2026-08-23T12:00:00+00:00".to_string(),
        };

        // when (operation):
        let result = MessageFormatter::format_message(&body);

        // then (expected result):
        assert!(result.contains("!! SOS from @alice"));
        assert!(result.contains("sent at 2026-08-23T12:00:00+00:00"));
    }

    #[test]
    fn test_format_battery_shows_percentage() {
        // given (precondition) / when (operation):
        let result = MessageFormatter::format_battery("bob", 0.17, true);

        // then (expected result):
        assert!(result.contains("17%"));
        assert!(result.contains("charging"));
    }
}
