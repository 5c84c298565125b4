use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::core::{Reservation, ReservationRepository};
use crate::domain::DataAccessError;

/// 予約一覧をJSON配列として1ファイルに保存するリポジトリ
#[derive(Clone, Debug)]
pub struct JsonFileReservationRepository {
    path: PathBuf,
}

impl JsonFileReservationRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temporary_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ReservationRepository for JsonFileReservationRepository {
    async fn load(&self) -> Result<Vec<Reservation>, DataAccessError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("保存ファイルがありません: {}", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(DataAccessError::ReadError(Box::new(e))),
        }
    }

    /// 一時ファイルに書き出してから置き換える
    async fn save(&self, reservations: &[Reservation]) -> Result<(), DataAccessError> {
        let json = serde_json::to_vec_pretty(reservations)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        let temporary = self.temporary_path();
        fs::write(&temporary, json).await.map_err(write_error)?;
        fs::rename(&temporary, &self.path)
            .await
            .map_err(write_error)?;
        debug!(
            "予約を{}件保存しました: {}",
            reservations.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn write_error(e: std::io::Error) -> DataAccessError {
    DataAccessError::WriteError(Box::new(e))
}

#[cfg(test)]
mod tests {
    use crate::domain::core::{ReservationRegistry, ReservationRequest};

    use super::*;

    fn request(room: &str, start: &str, end: &str) -> ReservationRequest {
        ReservationRequest {
            room: room.to_owned(),
            date: "2024-01-01".to_owned(),
            start_time: start.to_owned(),
            end_time: end.to_owned(),
            name: "Jane".to_owned(),
            surname: "Doe".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileReservationRepository::new(dir.path().join("reservations.json"));
        assert!(repo.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reservations.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let repo = JsonFileReservationRepository::new(&path);
        assert!(matches!(
            repo.load().await,
            Err(DataAccessError::FormatError(_))
        ));

        let registry = ReservationRegistry::init(repo).await;
        assert!(registry.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("reservations.json");
        let repo = JsonFileReservationRepository::new(&path);
        let registry = ReservationRegistry::init(repo.clone()).await;
        registry.create(request("A", "09:00", "10:00")).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "id": 1,
                "room": "A",
                "date": "2024-01-01",
                "startTime": "09:00:00",
                "endTime": "10:00:00",
                "name": "Jane",
                "surname": "Doe",
            }])
        );
        assert!(!repo.temporary_path().exists());
    }

    #[tokio::test]
    async fn test_restart_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reservations.json");

        let registry = ReservationRegistry::init(JsonFileReservationRepository::new(&path)).await;
        registry.create(request("A", "09:00", "10:00")).await.unwrap();
        registry.create(request("B", "09:00", "10:00")).await.unwrap();
        registry.create(request("A", "10:00", "11:00")).await.unwrap();
        registry.update("2", request("C", "12:00", "13:30")).await.unwrap();
        registry.delete("3").await.unwrap();
        let before = registry.list_all().await;

        let restarted =
            ReservationRegistry::init(JsonFileReservationRepository::new(&path)).await;
        assert_eq!(restarted.list_all().await, before);
        let next = restarted
            .create(request("D", "09:00", "10:00"))
            .await
            .unwrap();
        assert_eq!(*crate::domain::Entity::id(&next), 3);
    }

    #[tokio::test]
    async fn test_load_max_id_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reservations.json");
        std::fs::write(
            &path,
            r#"[{"id":18446744073709551615,"room":"A","date":"2024-01-01","startTime":"09:00:00","endTime":"10:00:00","name":"Jane","surname":"Doe"}]"#,
        )
        .unwrap();

        let registry = ReservationRegistry::init(JsonFileReservationRepository::new(&path)).await;
        assert_eq!(registry.list_all().await.len(), 1);
        assert_eq!(
            registry.create(request("B", "09:00", "10:00")).await,
            Err(crate::domain::core::ReservationError::IdExhausted)
        );
        assert_eq!(registry.list_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let repo = JsonFileReservationRepository::new(blocker.join("reservations.json"));
        assert!(matches!(
            repo.save(&[]).await,
            Err(DataAccessError::WriteError(_))
        ));
    }
}
