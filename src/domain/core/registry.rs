use std::collections::HashSet;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::domain::Entity;

use super::{
    Reservation, ReservationDraft, ReservationError, ReservationId, ReservationRepository,
    ReservationRequest,
};

/// 予約レジストリ
///
/// メモリ上の予約一覧とIDカウンタを保持し、変更のたびにリポジトリへ全件を保存する。
/// 変更系の操作は書き込みロックを保持したまま検証・変更・保存までを行うため、
/// 読み取り側から変更途中の状態が見えることはない。
///
/// 保存に失敗しても変更は取り消さない。エラーはログに出力するだけで呼び出し元には返さない。
pub struct ReservationRegistry<R> {
    repository: R,
    state: RwLock<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    reservations: Vec<Reservation>,
    last_id: u64,
}

impl RegistryState {
    /// IDを使い切った場合はカウンタを進めずにエラーを返す
    fn next_id(&mut self) -> Result<ReservationId, ReservationError> {
        self.last_id = self
            .last_id
            .checked_add(1)
            .ok_or(ReservationError::IdExhausted)?;
        Ok(ReservationId::from(self.last_id))
    }

    fn position(&self, id: ReservationId) -> Option<usize> {
        self.reservations.iter().position(|r| r.id() == id)
    }

    fn validate_overlapping(
        &self,
        draft: &ReservationDraft,
        exclude: Option<ReservationId>,
    ) -> Result<(), ReservationError> {
        match self
            .reservations
            .iter()
            .filter(|r| Some(r.id()) != exclude)
            .find(|r| r.overlaps(draft.room, draft.date, &draft.time))
        {
            Some(_) => Err(ReservationError::RoomConflict(draft.room)),
            None => Ok(()),
        }
    }
}

impl<R: ReservationRepository> ReservationRegistry<R> {
    /// 保存済みの予約を読み込んでレジストリを作成する
    ///
    /// 読み込みに失敗した場合は空のレジストリで起動する。
    pub async fn init(repository: R) -> Self {
        let reservations = match repository.load().await {
            Ok(reservations) => reservations,
            Err(e) => {
                error!("予約の読み込みに失敗しました。空の状態で起動します: {}", e);
                Vec::new()
            }
        };
        let mut seen = HashSet::new();
        let reservations = reservations
            .into_iter()
            .filter(|r| {
                let first = seen.insert(r.id());
                if !first {
                    warn!("重複したIDの{}を読み飛ばします: {}", Reservation::ENTITY_NAME, r.id());
                }
                first
            })
            .collect::<Vec<_>>();
        let last_id = reservations.iter().map(|r| *r.id()).max().unwrap_or(0);
        info!(
            "{}を{}件読み込みました (最大ID: {})",
            Reservation::ENTITY_NAME,
            reservations.len(),
            last_id
        );
        Self {
            repository,
            state: RwLock::new(RegistryState {
                reservations,
                last_id,
            }),
        }
    }

    /// 登録順ですべての予約を返す
    pub async fn list_all(&self) -> Vec<Reservation> {
        self.state.read().await.reservations.clone()
    }

    pub async fn create(&self, request: ReservationRequest) -> Result<Reservation, ReservationError> {
        let draft = request.parse()?;
        draft.validate_time()?;

        let mut state = self.state.write().await;
        state.validate_overlapping(&draft, None)?;
        let id = state.next_id()?;
        let reservation = Reservation::create(id, draft);
        state.reservations.push(reservation.clone());
        self.persist(&state.reservations).await;

        info!("{}を作成しました: {}", Reservation::ENTITY_NAME, id);
        Ok(reservation)
    }

    pub async fn update(
        &self,
        id: &str,
        request: ReservationRequest,
    ) -> Result<Reservation, ReservationError> {
        let id = id.parse::<ReservationId>()?;

        let mut state = self.state.write().await;
        let index = state
            .position(id)
            .ok_or_else(|| ReservationError::NotFound(id.to_string()))?;
        let draft = request.parse()?;
        draft.validate_time()?;
        state.validate_overlapping(&draft, Some(id))?;

        let reservation = &mut state.reservations[index];
        reservation.change(draft);
        let reservation = reservation.clone();
        self.persist(&state.reservations).await;

        info!("{}を更新しました: {}", Reservation::ENTITY_NAME, id);
        Ok(reservation)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ReservationError> {
        let id = id.parse::<ReservationId>()?;

        let mut state = self.state.write().await;
        let index = state
            .position(id)
            .ok_or_else(|| ReservationError::NotFound(id.to_string()))?;
        state.reservations.remove(index);
        self.persist(&state.reservations).await;

        info!("{}を削除しました: {}", Reservation::ENTITY_NAME, id);
        Ok(())
    }

    async fn persist(&self, reservations: &[Reservation]) {
        if let Err(e) = self.repository.save(reservations).await {
            error!("予約の保存に失敗しました。メモリ上の変更は保持されます: {}", e);
        }
    }
}
