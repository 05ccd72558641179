use std::path::Path;

use async_trait::async_trait;
use ferry_core_lib::{
    data::requests::{FileEntry, RequestBody, TransferCorrelation},
    Result,
};
use tokio::fs;

use crate::{events::ServerEvent, peer::PeerContext};

use super::{ControlCommand, RequestOrigin};

pub struct FileListRequestCommand {
    pub folder: String,
}

#[async_trait]
impl ControlCommand for FileListRequestCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        let folder = if self.folder.is_empty() {
            context.settings.transfer_folder.clone()
        } else {
            Path::new(&self.folder).to_path_buf()
        };
        let folder_name = folder.display().to_string();

        let response = match list_files(&folder).await {
            None => RequestBody::RequestedFolderDoesNotExist {
                correlation: TransferCorrelation::none(),
                folder: folder_name,
            },
            Some(files) if files.is_empty() => {
                RequestBody::RequestedFolderIsEmpty { folder: folder_name }
            }
            Some(files) => RequestBody::FileListResponse {
                folder: folder_name,
                files,
            },
        };

        context.sender.send(&origin.remote_server, response).await
    }
}

/// Regular files directly inside `folder`, sorted by name. `None` when the
/// folder cannot be read.
async fn list_files(folder: &Path) -> Option<Vec<FileEntry>> {
    let mut entries = fs::read_dir(folder).await.ok()?;
    let mut files = vec![];

    while let Ok(Some(entry)) = entries.next_entry().await {
        let metadata = match entry.metadata().await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => continue,
        };

        files.push(FileEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            folder: folder.display().to_string(),
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Some(files)
}

pub struct FileListResponseCommand {
    pub folder: String,
    pub files: Vec<FileEntry>,
}

#[async_trait]
impl ControlCommand for FileListResponseCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        context.events.send(ServerEvent::FileListReceived {
            remote_server: origin.remote_server,
            folder: self.folder.clone(),
            files: self.files.clone(),
        });
        Ok(())
    }
}

pub struct FolderIsEmptyCommand {
    pub folder: String,
}

#[async_trait]
impl ControlCommand for FolderIsEmptyCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        context.events.send(ServerEvent::RemoteFolderEmpty {
            remote_server: origin.remote_server,
            folder: self.folder.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lists_only_regular_files() {
        let folder = tempfile::tempdir().unwrap();
        std::fs::write(folder.path().join("b.txt"), b"bb").unwrap();
        std::fs::write(folder.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(folder.path().join("nested")).unwrap();

        let files = list_files(folder.path()).await.unwrap();

        let names: Vec<&str> = files.iter().map(|file| file.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(files[1].size, 2);
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let folder = tempfile::tempdir().unwrap();
        assert!(list_files(&folder.path().join("missing")).await.is_none());
    }
}
