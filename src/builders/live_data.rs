//! Folds a match's EventInfo rows into [`EventLiveData`].

use super::HierarchicalBuilder;
use crate::entities::{EventInfoDto, MatchDto};
use crate::model::{EventLiveData, EventStatus, Side, SidePair};
use crate::store::EntityStore;
use tracing::trace;

const SCORE: &str = "1";
const YELLOW_CARDS: &str = "2";
const YELLOW_RED_CARDS: &str = "3";
const RED_CARDS: &str = "4";
const SERVE: &str = "37";
const EVENT_STATUS: &str = "92";
const MATCH_TIME: &str = "95";

const WHOLE_MATCH: &str = "whole match";

pub struct EventLiveDataBuilder;

impl EventLiveDataBuilder {
    /// Build live data for `match_id` from its rows.
    ///
    /// Values are mapped to home / away by participant id, never by position.
    /// Without the match row, scores fall back to positional order and cards
    /// and serve stay unknown.
    pub fn from_infos(
        match_id: &str,
        infos: &[EventInfoDto],
        match_row: Option<&MatchDto>,
    ) -> EventLiveData {
        let mut live = EventLiveData {
            match_id: match_id.to_string(),
            ..Default::default()
        };

        for info in infos {
            match info.type_id.as_str() {
                SCORE => {
                    let whole_match = info
                        .event_part_name
                        .as_deref()
                        .is_some_and(|part| part.eq_ignore_ascii_case(WHOLE_MATCH));
                    if whole_match {
                        live.score = score_pair(info, match_row);
                    }
                }
                YELLOW_CARDS => live.yellow_cards = card_pair(info, match_row),
                YELLOW_RED_CARDS => live.yellow_red_cards = card_pair(info, match_row),
                RED_CARDS => live.red_cards = card_pair(info, match_row),
                SERVE => live.serving = serving_side(info, match_row),
                EVENT_STATUS => live.status = event_status(info),
                MATCH_TIME => live.match_time = info.param_float1.map(to_count),
                other => trace!(match_id = %match_id, type_id = %other, "ignoring event info"),
            }
        }
        live
    }
}

impl HierarchicalBuilder for EventLiveDataBuilder {
    type Output = EventLiveData;

    /// `None` when the store has neither the match nor any of its rows.
    fn build(store: &EntityStore, id: &str) -> Option<EventLiveData> {
        let match_row = store.get::<MatchDto>(id);
        let infos = store.event_infos(id);
        if match_row.is_none() && infos.is_empty() {
            return None;
        }
        Some(Self::from_infos(id, &infos, match_row.as_ref()))
    }
}

fn to_count(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value as u32
    } else {
        0
    }
}

fn side_of(participant_id: &str, match_row: &MatchDto) -> Option<Side> {
    if participant_id == match_row.home_participant_id {
        Some(Side::Home)
    } else if participant_id == match_row.away_participant_id {
        Some(Side::Away)
    } else {
        None
    }
}

/// Map the two (participant, value) slots of a row onto home / away.
fn mapped_pair(info: &EventInfoDto, match_row: &MatchDto) -> SidePair {
    let mut pair = SidePair::default();
    let slots = [
        (info.param_participant_id1.as_deref(), info.param_float1),
        (info.param_participant_id2.as_deref(), info.param_float2),
    ];
    for (participant, value) in slots {
        let (Some(participant), Some(value)) = (participant, value) else {
            continue;
        };
        match side_of(participant, match_row) {
            Some(Side::Home) => pair.home = Some(to_count(value)),
            Some(Side::Away) => pair.away = Some(to_count(value)),
            None => trace!(participant = %participant, "participant matches neither side"),
        }
    }
    pair
}

fn score_pair(info: &EventInfoDto, match_row: Option<&MatchDto>) -> SidePair {
    match match_row {
        Some(row) => mapped_pair(info, row),
        None => SidePair {
            home: Some(to_count(info.param_float1.unwrap_or(0.0))),
            away: Some(to_count(info.param_float2.unwrap_or(0.0))),
        },
    }
}

fn card_pair(info: &EventInfoDto, match_row: Option<&MatchDto>) -> Option<SidePair> {
    let pair = mapped_pair(info, match_row?);
    (!pair.is_empty()).then_some(pair)
}

fn serving_side(info: &EventInfoDto, match_row: Option<&MatchDto>) -> Option<Side> {
    side_of(info.param_participant_id1.as_deref()?, match_row?)
}

fn event_status(info: &EventInfoDto) -> Option<EventStatus> {
    let status = info.param_event_status_name1.as_deref()?.to_lowercase();
    let part = info
        .param_event_part_name1
        .clone()
        .unwrap_or_else(|| status.clone());

    Some(match status.as_str() {
        "pending" | "not started" | "not_started" => EventStatus::NotStarted,
        "ended" | "interrupted" | "canceled" | "cancelled" | "walkover" | "abandoned"
        | "retired" => EventStatus::Ended(part),
        _ => EventStatus::InProgress(part),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::fixtures::match_row;

    fn info(type_id: &str) -> EventInfoDto {
        EventInfoDto {
            id: format!("info-{}", type_id),
            event_id: "m1".to_string(),
            type_id: type_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_score_mapped_by_participant() {
        let row = match_row("m1");
        let score = EventInfoDto {
            event_part_name: Some("Whole Match".to_string()),
            param_participant_id1: Some("m1-away".to_string()),
            param_float1: Some(1.0),
            param_participant_id2: Some("m1-home".to_string()),
            param_float2: Some(3.0),
            ..info(SCORE)
        };
        let first_half = EventInfoDto {
            id: "info-half".to_string(),
            event_part_name: Some("1st Half".to_string()),
            param_participant_id1: Some("m1-home".to_string()),
            param_float1: Some(9.0),
            ..info(SCORE)
        };

        let live = EventLiveDataBuilder::from_infos("m1", &[score, first_half], Some(&row));
        assert_eq!(live.score.home, Some(3));
        assert_eq!(live.score.away, Some(1));
    }

    #[test]
    fn test_status_time_serve_and_cards() {
        let row = match_row("m1");
        let infos = vec![
            EventInfoDto {
                param_event_status_name1: Some("In Progress".to_string()),
                param_event_part_name1: Some("2nd Half".to_string()),
                ..info(EVENT_STATUS)
            },
            EventInfoDto {
                param_float1: Some(67.0),
                ..info(MATCH_TIME)
            },
            EventInfoDto {
                param_participant_id1: Some("m1-away".to_string()),
                ..info(SERVE)
            },
            EventInfoDto {
                param_participant_id1: Some("m1-home".to_string()),
                param_float1: Some(2.0),
                ..info(YELLOW_CARDS)
            },
            EventInfoDto {
                param_participant_id1: Some("someone-else".to_string()),
                param_float1: Some(1.0),
                ..info(RED_CARDS)
            },
        ];

        let live = EventLiveDataBuilder::from_infos("m1", &infos, Some(&row));
        assert_eq!(live.status, Some(EventStatus::InProgress("2nd Half".to_string())));
        assert_eq!(live.match_time_label().as_deref(), Some("67'"));
        assert_eq!(live.serving, Some(Side::Away));
        assert_eq!(live.yellow_cards.unwrap().home, Some(2));
        assert!(live.red_cards.is_none());
    }

    #[test]
    fn test_without_match_row() {
        let infos = vec![
            EventInfoDto {
                event_part_name: Some("Whole Match".to_string()),
                param_float1: Some(2.0),
                param_float2: Some(0.0),
                ..info(SCORE)
            },
            EventInfoDto {
                param_participant_id1: Some("p1".to_string()),
                param_float1: Some(1.0),
                ..info(YELLOW_CARDS)
            },
            EventInfoDto {
                param_event_status_name1: Some("ended".to_string()),
                ..info(EVENT_STATUS)
            },
        ];

        let live = EventLiveDataBuilder::from_infos("m1", &infos, None);
        assert_eq!(live.score, SidePair { home: Some(2), away: Some(0) });
        assert!(live.yellow_cards.is_none());
        assert_eq!(live.status, Some(EventStatus::Ended("ended".to_string())));
    }

    #[test]
    fn test_build_from_store() {
        let store = EntityStore::new();
        assert!(EventLiveDataBuilder::build(&store, "m1").is_none());

        store.store(match_row("m1"));
        let live = EventLiveDataBuilder::build(&store, "m1").unwrap();
        assert_eq!(live.match_id, "m1");
        assert!(live.status.is_none());
    }
}
