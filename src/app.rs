use std::{
    sync::Mutex,
    time::Instant,
};

use crossterm::event::KeyCode;
use tracing::info;

use crate::feed::{lock_shared, SharedFeed};
use crate::model::{AthleteData, Metrics};
use crate::roster::{AthleteProfile, Roster};
use crate::stats::AthleteStats;
use crate::store::{AthleteStore, CycleReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Dashboard,
    AthleteDetail(String),
}

/// One line of the dashboard table.
#[derive(Debug, Clone)]
pub struct DashboardRow {
    pub athlete_id: String,
    pub name: String,
    /// `None` when the athlete missed the last cycle
    pub latest: Option<Metrics>,
    pub stats: Option<AthleteStats>,
    pub step_goal: Option<u64>,
    pub holds_record: bool,
}

// Main application state
pub struct App {
    pub store: AthleteStore,
    pub roster: Roster,
    pub view: View,
    /// Highlighted athlete; follows the id, not the row, as rows reorder
    pub selected: Option<String>,
    pub history_window: usize,
    pub feed_finished: bool,
    pub last_tick: Instant,
}

impl App {
    pub fn new(store: AthleteStore, roster: Roster, history_window: usize) -> App {
        App {
            store,
            roster,
            view: View::Dashboard,
            selected: None,
            history_window,
            feed_finished: false,
            last_tick: Instant::now(),
        }
    }

    /// Applies every snapshot the feed thread queued since the last tick.
    pub fn on_tick(&mut self, shared: &Mutex<SharedFeed>) -> Vec<CycleReport> {
        self.drain_feed(shared, usize::MAX)
    }

    /// Applies at most `limit` queued snapshots, oldest first. The rest stay
    /// queued, and the feed only counts as finished once nothing is left.
    pub fn drain_feed(&mut self, shared: &Mutex<SharedFeed>, limit: usize) -> Vec<CycleReport> {
        let (batches, finished) = {
            let mut feed = lock_shared(shared);
            let take = limit.min(feed.pending.len());
            let batches: Vec<_> = feed.pending.drain(..take).collect();
            (batches, feed.finished && feed.pending.is_empty())
        };

        let reports = batches.into_iter().map(|batch| self.ingest(batch)).collect();
        if finished && !self.feed_finished {
            info!(cycles = self.store.num_measurements(), "no more snapshots");
        }
        self.feed_finished = finished;
        reports
    }

    /// Feeds one snapshot to the store and logs what changed.
    pub fn ingest(&mut self, batch: Vec<AthleteData>) -> CycleReport {
        let report = self.store.replace_list(batch);

        info!(
            cycle = report.cycle,
            athletes = report.athletes,
            absent = report.absent.len(),
            "cycle processed"
        );
        if !report.new_athletes.is_empty() {
            info!(athletes = ?report.new_athletes, "new athletes");
        }
        if let Some(record) = &report.new_record {
            info!(
                athlete = %record.athlete_id,
                speed = record.record_value,
                "new speed record"
            );
        }

        report
    }

    /// Last snapshot order first, then athletes that dropped out, by id.
    pub fn athlete_order(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for sample in self.store.athlete_list() {
            if !ids.contains(&sample.athlete_id) {
                ids.push(sample.athlete_id.clone());
            }
        }
        for id in self.store.known_athletes() {
            if !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }

    pub fn dashboard_rows(&self) -> Vec<DashboardRow> {
        let record_holder = self.store.speed_record().map(|record| record.athlete_id.as_str());

        self.athlete_order()
            .into_iter()
            .map(|id| DashboardRow {
                name: self.roster.display_name(&id),
                latest: self.store.latest(&id).map(|sample| sample.metrics),
                stats: self.store.stats(&id).copied(),
                step_goal: self.roster.get(&id).map(|profile| profile.step_goal),
                holds_record: record_holder == Some(id.as_str()),
                athlete_id: id,
            })
            .collect()
    }

    /// Row of the highlighted athlete, the first row if none is picked yet.
    pub fn selected_index(&self) -> usize {
        self.selected
            .as_ref()
            .and_then(|selected| self.athlete_order().iter().position(|id| id == selected))
            .unwrap_or(0)
    }

    pub fn selected_athlete(&self) -> Option<String> {
        let order = self.athlete_order();
        self.selected
            .clone()
            .filter(|selected| order.contains(selected))
            .or_else(|| order.into_iter().next())
    }

    pub fn profile(&self, athlete_id: &str) -> Option<&AthleteProfile> {
        self.roster.get(athlete_id)
    }

    pub fn open_athlete(&mut self, athlete_id: impl Into<String>) {
        let athlete_id = athlete_id.into();
        self.selected = Some(athlete_id.clone());
        self.view = View::AthleteDetail(athlete_id);
    }

    pub fn back_to_dashboard(&mut self) {
        self.view = View::Dashboard;
    }

    // Moves the highlight `offset` rows from the current athlete, wrapping
    fn select_offset(&mut self, offset: isize) {
        let order = self.athlete_order();
        if order.is_empty() {
            return;
        }
        let rows = order.len() as isize;
        let current = self.selected_index() as isize;
        let next = (current + offset).rem_euclid(rows) as usize;
        self.selected = order.into_iter().nth(next);
    }

    fn select_next(&mut self) {
        self.select_offset(1);
    }

    fn select_previous(&mut self) {
        self.select_offset(-1);
    }

    /// Handles a key press. Returns `true` when the app should quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if code == KeyCode::Char('q') {
            return true;
        }

        match self.view.clone() {
            View::Dashboard => match code {
                KeyCode::Down | KeyCode::Char('j') => self.select_next(),
                KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
                KeyCode::Enter => {
                    if let Some(id) = self.selected_athlete() {
                        self.open_athlete(id);
                    }
                }
                _ => {}
            },
            View::AthleteDetail(viewing) => {
                // Step from the athlete on screen
                self.selected = Some(viewing);
                match code {
                    KeyCode::Esc | KeyCode::Backspace => self.back_to_dashboard(),
                    KeyCode::Right | KeyCode::Char('l') => {
                        self.select_next();
                        if let Some(id) = self.selected_athlete() {
                            self.view = View::AthleteDetail(id);
                        }
                    }
                    KeyCode::Left | KeyCode::Char('h') => {
                        self.select_previous();
                        if let Some(id) = self.selected_athlete() {
                            self.view = View::AthleteDetail(id);
                        }
                    }
                    _ => {}
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(id: &str, heart_rate: f64, speed: f64) -> AthleteData {
        AthleteData::new(
            id,
            Utc::now(),
            Metrics {
                heart_rate,
                steps: 100,
                speed,
            },
        )
    }

    fn app_with(batches: Vec<Vec<AthleteData>>) -> App {
        let mut app = App::new(AthleteStore::new(), Roster::new(), 60);
        for batch in batches {
            app.ingest(batch);
        }
        app
    }

    #[test]
    fn test_on_tick_drains_in_order() {
        let shared = Mutex::new(SharedFeed::default());
        {
            let mut feed = lock_shared(&shared);
            feed.pending.push_back(vec![sample("a", 100.0, 5.0)]);
            feed.pending.push_back(vec![sample("a", 110.0, 6.0)]);
            feed.finished = true;
        }

        let mut app = App::new(AthleteStore::new(), Roster::new(), 60);
        let reports = app.on_tick(&shared);

        assert_eq!(reports.iter().map(|r| r.cycle).collect::<Vec<_>>(), vec![1, 2]);
        assert!(app.feed_finished);
        assert!(lock_shared(&shared).pending.is_empty());
        assert_eq!(
            app.store.dataset("a").unwrap().heart_rate,
            vec![Some(100.0), Some(110.0)]
        );
    }

    #[test]
    fn test_drain_feed_leaves_the_rest_queued() {
        let shared = Mutex::new(SharedFeed::default());
        {
            let mut feed = lock_shared(&shared);
            for hr in [100.0, 110.0, 120.0] {
                feed.pending.push_back(vec![sample("a", hr, 5.0)]);
            }
            feed.finished = true;
        }

        let mut app = App::new(AthleteStore::new(), Roster::new(), 60);
        assert_eq!(app.drain_feed(&shared, 2).len(), 2);
        assert_eq!(app.store.num_measurements(), 2);
        assert!(!app.feed_finished);

        assert_eq!(app.on_tick(&shared).len(), 1);
        assert!(app.feed_finished);
        assert_eq!(app.store.stats("a").unwrap().heart_rate.max, 120.0);
    }

    #[test]
    fn test_order_puts_absent_athletes_last() {
        let app = app_with(vec![
            vec![sample("c", 90.0, 1.0), sample("a", 90.0, 1.0), sample("b", 90.0, 1.0)],
            vec![sample("b", 90.0, 1.0), sample("c", 90.0, 1.0)],
        ]);

        assert_eq!(app.athlete_order(), vec!["b", "c", "a"]);
        let rows = app.dashboard_rows();
        assert!(rows[2].latest.is_none());
        assert!(rows[2].stats.is_some());
    }

    #[test]
    fn test_record_holder_is_flagged() {
        let app = app_with(vec![vec![sample("a", 90.0, 4.0), sample("b", 90.0, 9.0)]]);
        let rows = app.dashboard_rows();

        assert!(!rows[0].holds_record);
        assert!(rows[1].holds_record);
    }

    #[test]
    fn test_navigation_between_views() {
        let mut app = app_with(vec![vec![sample("a", 90.0, 1.0), sample("b", 90.0, 1.0)]]);

        assert!(!app.handle_key(KeyCode::Down));
        assert_eq!(app.selected_index(), 1);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view, View::AthleteDetail("b".to_string()));

        app.handle_key(KeyCode::Right);
        assert_eq!(app.view, View::AthleteDetail("a".to_string()));

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.view, View::Dashboard);
        assert_eq!(app.selected_index(), 0);

        app.handle_key(KeyCode::Up);
        assert_eq!(app.selected_index(), 1);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn test_keys_on_empty_dashboard() {
        let mut app = app_with(vec![]);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.selected_index(), 0);
        assert!(app.selected.is_none());
        assert_eq!(app.view, View::Dashboard);
    }

    #[test]
    fn test_cursor_follows_athlete_when_rows_reorder() {
        let mut app = app_with(vec![vec![
            sample("a", 90.0, 1.0),
            sample("b", 90.0, 1.0),
            sample("c", 90.0, 1.0),
        ]]);
        app.handle_key(KeyCode::Down);
        assert_eq!(app.selected_athlete().as_deref(), Some("b"));

        // "a" drops out and moves to the bottom
        app.ingest(vec![sample("b", 91.0, 1.0), sample("c", 91.0, 1.0)]);
        assert_eq!(app.athlete_order(), vec!["b", "c", "a"]);
        assert_eq!(app.selected_athlete().as_deref(), Some("b"));
        assert_eq!(app.selected_index(), 0);

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view, View::AthleteDetail("b".to_string()));
    }

    #[test]
    fn test_detail_steps_from_viewed_athlete_after_reorder() {
        let mut app = app_with(vec![vec![
            sample("a", 90.0, 1.0),
            sample("b", 90.0, 1.0),
            sample("c", 90.0, 1.0),
        ]]);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view, View::AthleteDetail("b".to_string()));

        app.ingest(vec![sample("b", 91.0, 1.0), sample("c", 91.0, 1.0)]);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.view, View::AthleteDetail("c".to_string()));

        app.handle_key(KeyCode::Right);
        assert_eq!(app.view, View::AthleteDetail("a".to_string()));

        app.handle_key(KeyCode::Left);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.view, View::AthleteDetail("b".to_string()));
    }
}
