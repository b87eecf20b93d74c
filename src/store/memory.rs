use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};
use futures::FutureExt;
use futures::future::{self, BoxFuture};

use super::{AttendanceStore, StoreError, StoreResult};
use crate::calendar::DateRange;
use crate::model::attendance::{AttendanceRecord, LunchBreak, NewAttendance, PunchOut};
use crate::model::profile::{Holiday, StaffProfile};

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<u64, StaffProfile>,
    holidays: Vec<Holiday>,
    records: Vec<AttendanceRecord>,
    next_record_id: u64,
    next_lunch_id: u64,
}

impl MemoryState {
    fn record_mut(&mut self, record_id: u64) -> Option<&mut AttendanceRecord> {
        self.records.iter_mut().find(|r| r.id == record_id)
    }

    fn insert(&mut self, mut record: AttendanceRecord) -> StoreResult<AttendanceRecord> {
        if self
            .records
            .iter()
            .any(|r| r.user_id == record.user_id && r.date == record.date)
        {
            return Err(StoreError::Duplicate);
        }
        self.next_record_id += 1;
        record.id = self.next_record_id;
        for lunch in &mut record.lunch_breaks {
            self.next_lunch_id += 1;
            lunch.id = self.next_lunch_id;
            lunch.attendance_id = record.id;
        }
        self.records.push(record.clone());
        Ok(record)
    }
}

/// Process-local store with the same uniqueness rules as the MySQL backend.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: StaffProfile) {
        self.write().profiles.insert(profile.user_id, profile);
    }

    pub fn insert_holiday(&self, holiday: Holiday) {
        self.write().holidays.push(holiday);
    }

    /// Seeds a complete record (ids are reassigned).
    pub fn insert_record(&self, record: AttendanceRecord) -> StoreResult<AttendanceRecord> {
        self.write().insert(record)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryState> {
        self.state.read().expect("memory store poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryState> {
        self.state.write().expect("memory store poisoned")
    }
}

fn ready<T: Send + 'static>(value: StoreResult<T>) -> BoxFuture<'static, StoreResult<T>> {
    future::ready(value).boxed()
}

impl AttendanceStore for MemoryStore {
    fn find_profile(&self, user_id: u64) -> BoxFuture<'_, StoreResult<Option<StaffProfile>>> {
        ready(Ok(self.read().profiles.get(&user_id).cloned()))
    }

    fn list_profiles(&self) -> BoxFuture<'_, StoreResult<Vec<StaffProfile>>> {
        let mut profiles: Vec<StaffProfile> = self.read().profiles.values().cloned().collect();
        profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        ready(Ok(profiles))
    }

    fn find_holiday(&self, date: NaiveDate) -> BoxFuture<'_, StoreResult<Option<Holiday>>> {
        ready(Ok(self
            .read()
            .holidays
            .iter()
            .find(|h| h.date == date)
            .cloned()))
    }

    fn list_holidays(&self, range: DateRange) -> BoxFuture<'_, StoreResult<Vec<Holiday>>> {
        ready(Ok(self
            .read()
            .holidays
            .iter()
            .filter(|h| range.contains(h.date))
            .cloned()
            .collect()))
    }

    fn find_record(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> BoxFuture<'_, StoreResult<Option<AttendanceRecord>>> {
        ready(Ok(self
            .read()
            .records
            .iter()
            .find(|r| r.user_id == user_id && r.date == date)
            .cloned()))
    }

    fn list_records(
        &self,
        user_id: u64,
        range: DateRange,
    ) -> BoxFuture<'_, StoreResult<Vec<AttendanceRecord>>> {
        let mut records: Vec<AttendanceRecord> = self
            .read()
            .records
            .iter()
            .filter(|r| r.user_id == user_id && range.contains(r.date))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        ready(Ok(records))
    }

    fn list_records_on(&self, date: NaiveDate) -> BoxFuture<'_, StoreResult<Vec<AttendanceRecord>>> {
        let mut records: Vec<AttendanceRecord> = self
            .read()
            .records
            .iter()
            .filter(|r| r.date == date)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.user_id);
        ready(Ok(records))
    }

    fn create_record(&self, new: NewAttendance) -> BoxFuture<'_, StoreResult<AttendanceRecord>> {
        let record = AttendanceRecord {
            id: 0,
            user_id: new.user_id,
            date: new.date,
            punch_in_time: new.punch_in_time,
            punch_out_time: None,
            punch_in_location: new.punch_in_location,
            punch_out_location: None,
            working_hours: None,
            work_done: new.work_done,
            lunch_breaks: Vec::new(),
        };
        ready(self.write().insert(record))
    }

    fn close_record(&self, record_id: u64, punch_out: PunchOut) -> BoxFuture<'_, StoreResult<bool>> {
        let mut state = self.write();
        let closed = match state.record_mut(record_id) {
            Some(record) if record.punch_out_time.is_none() => {
                record.punch_out_time = Some(punch_out.punch_out_time);
                record.punch_out_location = punch_out.punch_out_location;
                record.working_hours = Some(punch_out.working_hours);
                record.work_done = punch_out.work_done;
                true
            }
            _ => false,
        };
        ready(Ok(closed))
    }

    fn start_lunch(
        &self,
        record_id: u64,
        start: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<Option<LunchBreak>>> {
        let mut state = self.write();
        let open = state.record_mut(record_id).is_some_and(|record| {
            record.punch_out_time.is_none() && record.active_lunch_break().is_none()
        });
        if !open {
            return ready(Ok(None));
        }

        state.next_lunch_id += 1;
        let lunch = LunchBreak {
            id: state.next_lunch_id,
            attendance_id: record_id,
            lunch_start_time: start,
            lunch_end_time: None,
            duration: None,
        };
        if let Some(record) = state.record_mut(record_id) {
            record.lunch_breaks.push(lunch.clone());
        }
        ready(Ok(Some(lunch)))
    }

    fn end_lunch(
        &self,
        lunch_id: u64,
        end: DateTime<Utc>,
        duration: i64,
    ) -> BoxFuture<'_, StoreResult<bool>> {
        let mut state = self.write();
        let ended = state
            .records
            .iter_mut()
            .flat_map(|r| r.lunch_breaks.iter_mut())
            .find(|b| b.id == lunch_id && b.lunch_end_time.is_none())
            .map(|lunch| {
                lunch.lunch_end_time = Some(end);
                lunch.duration = Some(duration);
            })
            .is_some();
        ready(Ok(ended))
    }

    fn delete_record(&self, user_id: u64, record_id: u64) -> BoxFuture<'_, StoreResult<bool>> {
        let mut state = self.write();
        let before = state.records.len();
        state
            .records
            .retain(|r| !(r.id == record_id && r.user_id == user_id));
        ready(Ok(state.records.len() < before))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use futures::executor::block_on;

    fn open_record(store: &MemoryStore) -> AttendanceRecord {
        let punch_in = Utc.with_ymd_and_hms(2024, 4, 2, 3, 30, 0).unwrap();
        block_on(store.create_record(NewAttendance {
            user_id: 1000,
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            punch_in_time: Some(punch_in),
            punch_in_location: None,
            work_done: None,
        }))
        .unwrap()
    }

    #[test]
    fn only_one_active_lunch_per_record() {
        let store = MemoryStore::new();
        let record = open_record(&store);
        let now = Utc.with_ymd_and_hms(2024, 4, 2, 7, 30, 0).unwrap();

        assert!(block_on(store.start_lunch(record.id, now)).unwrap().is_some());
        assert!(block_on(store.start_lunch(record.id, now)).unwrap().is_none());

        let stored = block_on(store.find_record(1000, record.date)).unwrap().unwrap();
        assert_eq!(stored.lunch_breaks.len(), 1);
    }

    #[test]
    fn lunch_needs_an_open_record() {
        let store = MemoryStore::new();
        let record = open_record(&store);
        let now = Utc.with_ymd_and_hms(2024, 4, 2, 12, 30, 0).unwrap();

        assert!(block_on(store.start_lunch(999, now)).unwrap().is_none());

        let closed = block_on(store.close_record(
            record.id,
            PunchOut {
                punch_out_time: now,
                punch_out_location: None,
                working_hours: 9.0,
                work_done: None,
            },
        ))
        .unwrap();
        assert!(closed);
        assert!(block_on(store.start_lunch(record.id, now)).unwrap().is_none());
    }
}
