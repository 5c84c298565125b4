use std::{num::IntErrorKind, ops::Range, str::FromStr};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Timelike};
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DataAccessError, Entity, Id};

/// 予約可能な時間帯 (0時からの秒数、08:00〜17:00)
pub const BUSINESS_HOURS: Range<u32> = 8 * 3600..17 * 3600;

/// 予約リポジトリ
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// 保存済みの予約をすべて読み込む
    async fn load(&self) -> Result<Vec<Reservation>, DataAccessError>;
    /// 予約をすべて保存する
    async fn save(&self, reservations: &[Reservation]) -> Result<(), DataAccessError>;
}

/// 予約ID
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Deref,
    Default,
)]
pub struct ReservationId(u64);

impl Id for ReservationId {
    type Inner = u64;
}

impl FromStr for ReservationId {
    type Err = ReservationError;

    /// 整数でなければ`MalformedId`、負の整数や`u64`に収まらない整数はどの予約にも一致しないため`NotFound`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(value) = s.parse::<u64>() {
            return Ok(ReservationId(value));
        }
        match s.parse::<i64>().map_err(|e| e.kind().clone()) {
            Ok(_) | Err(IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                Err(ReservationError::NotFound(s.to_owned()))
            }
            Err(_) => Err(ReservationError::MalformedId(s.to_owned())),
        }
    }
}

/// 会議室
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Room {
    A,
    B,
    C,
    D,
}

impl Room {
    pub const ALL: [Room; 4] = [Room::A, Room::B, Room::C, Room::D];
}

impl FromStr for Room {
    type Err = ReservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Room::A),
            "B" => Ok(Room::B),
            "C" => Ok(Room::C),
            "D" => Ok(Room::D),
            _ => Err(ReservationError::InvalidRoom(s.to_owned())),
        }
    }
}

/// 受け付けたままの予約パラメータ
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub room: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub name: String,
    pub surname: String,
}

impl ReservationRequest {
    /// 会議室を先に検証し、その後で日付と時刻を解析する
    pub fn parse(&self) -> Result<ReservationDraft, ReservationError> {
        let room = self.room.parse::<Room>()?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| ReservationError::MalformedInput)?;
        let start = parse_time(&self.start_time)?;
        let end = parse_time(&self.end_time)?;
        Ok(ReservationDraft {
            room,
            date,
            time: start..end,
            name: self.name.clone(),
            surname: self.surname.clone(),
        })
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, ReservationError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| ReservationError::MalformedInput)
}

/// 解析済みの予約内容
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationDraft {
    pub room: Room,
    pub date: NaiveDate,
    pub time: Range<NaiveTime>,
    pub name: String,
    pub surname: String,
}

impl ReservationDraft {
    pub fn validate_time(&self) -> Result<(), ReservationError> {
        let start = self.time.start.num_seconds_from_midnight();
        let end = self.time.end.num_seconds_from_midnight();
        if start < BUSINESS_HOURS.start || end > BUSINESS_HOURS.end || self.time.start >= self.time.end
        {
            return Err(ReservationError::InvalidTimeWindow);
        }
        Ok(())
    }
}

/// 予約エンティティ
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    id: ReservationId,
    room: Room,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    name: String,
    surname: String,
}

impl Reservation {
    pub fn create(id: ReservationId, draft: ReservationDraft) -> Self {
        Reservation {
            id,
            room: draft.room,
            date: draft.date,
            start_time: draft.time.start,
            end_time: draft.time.end,
            name: draft.name,
            surname: draft.surname,
        }
    }

    /// ID以外をすべて置き換える
    pub fn change(&mut self, draft: ReservationDraft) {
        self.room = draft.room;
        self.date = draft.date;
        self.start_time = draft.time.start;
        self.end_time = draft.time.end;
        self.name = draft.name;
        self.surname = draft.surname;
    }

    pub fn room(&self) -> Room {
        self.room
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> Range<NaiveTime> {
        self.start_time..self.end_time
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    /// 同じ会議室・同じ日付で時間帯が重なるか (半開区間なので端が接するだけなら重ならない)
    pub fn overlaps(&self, room: Room, date: NaiveDate, time: &Range<NaiveTime>) -> bool {
        self.room == room
            && self.date == date
            && self.start_time < time.end
            && time.start < self.end_time
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    const ENTITY_NAME: &'static str = "reservation";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 予約エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    /// 会議室が存在しません
    #[error("Invalid room: {0}. Valid rooms are A, B, C, D")]
    InvalidRoom(String),
    /// 日付または時刻の形式が不正です
    #[error("Invalid date or time format")]
    MalformedInput,
    /// 予約時間が営業時間外、または開始が終了以降です
    #[error("Reservation must be between 08:00 and 17:00 and start before it ends")]
    InvalidTimeWindow,
    /// 既存の予約と重なっています
    #[error("Room {0} is already reserved for the requested time")]
    RoomConflict(Room),
    /// IDが整数ではありません
    #[error("Invalid reservation id: {0}")]
    MalformedId(String),
    /// 予約が見つかりません
    #[error("Reservation not found: {0}")]
    NotFound(String),
    /// 採番できるIDが残っていません
    #[error("No reservation id is available")]
    IdExhausted,
}
