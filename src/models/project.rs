use schemars::JsonSchema;
use near_sdk::{
    borsh::{self, BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    env, AccountId};
use crate::models::traits::{
    Storable, StorageError, StorageMetrics,
    Ownable, OwnershipError, contains_control_characters};
use crate::models::config::{storage::*, text::*};
use crate::models::date::{self, NANOS_PER_DAY};
use crate::models::task::Priority;

pub type ProjectId = String;
pub type StageId = String;
pub type TodoId = String;
pub type SubtaskId = String;

// === Error Hierarchy ===
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum ProjectError {
    Validation(ProjectValidationError),
    Storage(StorageError),
    Access(OwnershipError),
    State(ProjectStateError),
    NotFound { entity: String, id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum ProjectValidationError {
    Name {
        reason: ProjectNameError,
        current_length: usize,
    },
    Description {
        reason: ProjectDescriptionError,
        current_length: usize,
    },
    Deadline {
        reason: ProjectDateError,
        provided_date: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum ProjectNameError {
    Empty,
    TooLong,
    InvalidCharacters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum ProjectDescriptionError {
    TooLong,
    InvalidCharacters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum ProjectDateError {
    InvalidFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum ProjectStateError {
    AlreadyCompleted { project_id: ProjectId },
}

// === Error Conversions ===
impl From<ProjectValidationError> for ProjectError {
    fn from(err: ProjectValidationError) -> Self {
        ProjectError::Validation(err)
    }
}

impl From<StorageError> for ProjectError {
    fn from(err: StorageError) -> Self {
        ProjectError::Storage(err)
    }
}

impl From<OwnershipError> for ProjectError {
    fn from(err: OwnershipError) -> Self {
        ProjectError::Access(err)
    }
}

impl From<ProjectStateError> for ProjectError {
    fn from(err: ProjectStateError) -> Self {
        ProjectError::State(err)
    }
}

impl std::fmt::Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(v) => write!(f, "Validation error: {:?}", v),
            Self::Storage(s) => write!(f, "Storage error: {:?}", s),
            Self::Access(a) => write!(f, "Access error: {:?}", a),
            Self::State(s) => write!(f, "State error: {:?}", s),
            Self::NotFound { entity, id } => write!(f, "{} not found: {}", entity, id),
        }
    }
}

impl std::fmt::Display for ProjectValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name { reason, current_length } => {
                write!(f, "Name validation error: {:?} (length: {})", reason, current_length)
            },
            Self::Description { reason, current_length } => {
                write!(f, "Description validation error: {:?} (length: {})", reason, current_length)
            },
            Self::Deadline { reason, provided_date } => {
                write!(f, "Deadline validation error: {:?} (date: {})", reason, provided_date)
            },
        }
    }
}

// === Core Data Structures ===
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct ProjectStage {
    pub id: StageId,
    pub name: String,
    pub completed: bool,
    pub order: u32,
    pub points: u32,
    pub comments: Option<String>,
    pub completed_at: Option<u64>,
}

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct ProjectTodoSubtask {
    pub id: SubtaskId,
    pub name: String,
    pub completed: bool,
}

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct ProjectTodo {
    pub id: TodoId,
    pub name: String,
    pub completed: bool,
    pub subtasks: Vec<ProjectTodoSubtask>,
}

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub stages: Vec<ProjectStage>,
    pub todos: Vec<ProjectTodo>,
    /// Completed-stage share, rounded to an integer percentage.
    pub progress: u32,
    pub deadline: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub is_completed: bool,
    pub completion_notes: Option<String>,
    /// Points snapshot taken at completion, never recomputed afterwards.
    pub total_points: Option<u32>,
    pub created_at: u64,
    pub updated_at: u64,
    pub completed_at: Option<u64>,
    #[schemars(with = "String")]
    owner_id: AccountId,
}

/// Archival record appended when a project completes.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct CompletedProject {
    pub id: String,
    pub original_project_id: ProjectId,
    pub name: String,
    pub description: String,
    pub progress: u32,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub completed_at: u64,
    pub completion_notes: Option<String>,
    pub total_points: u32,
    pub total_stages: u32,
    pub total_todos: u32,
    pub deadline: Option<String>,
    pub duration_days: u32,
    #[schemars(with = "String")]
    owner_id: AccountId,
}

// === Trait Definitions ===
pub trait ProjectValidation {
    fn validate_name(&mut self) -> Result<(), ProjectValidationError>;
    fn validate_description(&mut self) -> Result<(), ProjectValidationError>;
    fn validate_deadline(&self) -> Result<(), ProjectValidationError>;
}

// === Core Implementations ===
impl Project {
    pub fn new(
        name: String,
        description: String,
        deadline: Option<String>,
        priority: Priority,
        tags: Vec<String>,
        owner_id: AccountId,
    ) -> Result<Self, ProjectError> {
        let now = env::block_timestamp();

        let mut project = Self {
            id: format!("project-{}-{}", owner_id, now),
            name,
            description,
            stages: Vec::new(),
            todos: Vec::new(),
            progress: 0,
            deadline,
            priority,
            tags,
            is_completed: false,
            completion_notes: None,
            total_points: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            owner_id,
        };

        project.validate()?;
        Ok(project)
    }

    pub fn validate(&mut self) -> Result<(), ProjectError> {
        self.validate_name()
            .map_err(ProjectError::Validation)?;
        self.validate_description()
            .map_err(ProjectError::Validation)?;
        self.validate_deadline()
            .map_err(ProjectError::Validation)?;
        self.validate_storage()
            .map_err(ProjectError::Storage)?;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = env::block_timestamp();
    }

    fn recompute_progress(&mut self) {
        let total = self.stages.len() as u64;
        if total == 0 {
            self.progress = 0;
            return;
        }
        let completed = self.stages.iter().filter(|stage| stage.completed).count() as u64;
        self.progress = ((completed * 100 + total / 2) / total) as u32;
    }

    fn validate_item_name(name: &str) -> Result<(), ProjectError> {
        if name.is_empty() {
            return Err(ProjectValidationError::Name {
                reason: ProjectNameError::Empty,
                current_length: 0,
            }.into());
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(ProjectValidationError::Name {
                reason: ProjectNameError::TooLong,
                current_length: name.len(),
            }.into());
        }
        if contains_control_characters(name) {
            return Err(ProjectValidationError::Name {
                reason: ProjectNameError::InvalidCharacters,
                current_length: name.len(),
            }.into());
        }
        Ok(())
    }

    // === Stage Management ===

    /// Appends a stage at the end of the ordering. A zero point value falls
    /// back to `fallback_points` (the configured per-stage value).
    pub fn add_stage(
        &mut self,
        name: String,
        points: u32,
        comments: Option<String>,
        fallback_points: u32,
    ) -> Result<StageId, ProjectError> {
        Self::validate_item_name(&name)?;

        let stage_id = format!("stage-{}-{}", env::block_timestamp(), self.stages.len());
        self.stages.push(ProjectStage {
            id: stage_id.clone(),
            name,
            completed: false,
            order: self.stages.len() as u32,
            points: if points > 0 { points } else { fallback_points },
            comments,
            completed_at: None,
        });

        self.recompute_progress();
        self.touch();
        Ok(stage_id)
    }

    pub fn update_stage(
        &mut self,
        stage_id: &str,
        name: Option<String>,
        points: Option<u32>,
        comments: Option<String>,
    ) -> Result<(), ProjectError> {
        if let Some(ref name) = name {
            Self::validate_item_name(name)?;
        }

        let stage = self.stages.iter_mut()
            .find(|stage| stage.id == stage_id)
            .ok_or_else(|| ProjectError::NotFound {
                entity: "Stage".to_string(),
                id: stage_id.to_string(),
            })?;

        if let Some(name) = name {
            stage.name = name;
        }
        if let Some(points) = points {
            stage.points = points;
        }
        if let Some(comments) = comments {
            stage.comments = Some(comments);
        }

        self.recompute_progress();
        self.touch();
        Ok(())
    }

    /// Removes a stage and closes the ordering gap.
    pub fn delete_stage(&mut self, stage_id: &str) -> Result<(), ProjectError> {
        let position = self.stages.iter()
            .position(|stage| stage.id == stage_id)
            .ok_or_else(|| ProjectError::NotFound {
                entity: "Stage".to_string(),
                id: stage_id.to_string(),
            })?;

        self.stages.remove(position);
        for (index, stage) in self.stages.iter_mut().enumerate() {
            stage.order = index as u32;
        }

        self.recompute_progress();
        self.touch();
        Ok(())
    }

    /// Flips a stage's completion; completing records the timestamp and any
    /// comments supplied with the toggle. Returns the new state.
    pub fn toggle_stage(
        &mut self,
        stage_id: &str,
        comments: Option<String>,
    ) -> Result<bool, ProjectError> {
        let now = env::block_timestamp();
        let stage = self.stages.iter_mut()
            .find(|stage| stage.id == stage_id)
            .ok_or_else(|| ProjectError::NotFound {
                entity: "Stage".to_string(),
                id: stage_id.to_string(),
            })?;

        stage.completed = !stage.completed;
        if stage.completed {
            if comments.is_some() {
                stage.comments = comments;
            }
            stage.completed_at = Some(now);
        } else {
            stage.completed_at = None;
        }
        let completed = stage.completed;

        self.recompute_progress();
        self.touch();
        Ok(completed)
    }

    // === Todo Management ===
    pub fn add_todo(&mut self, name: String) -> Result<TodoId, ProjectError> {
        Self::validate_item_name(&name)?;

        let todo_id = format!("todo-{}-{}", env::block_timestamp(), self.todos.len());
        self.todos.push(ProjectTodo {
            id: todo_id.clone(),
            name,
            completed: false,
            subtasks: Vec::new(),
        });

        self.touch();
        Ok(todo_id)
    }

    pub fn update_todo(&mut self, todo_id: &str, name: String) -> Result<(), ProjectError> {
        Self::validate_item_name(&name)?;

        let todo = self.find_todo(todo_id)?;
        todo.name = name;

        self.touch();
        Ok(())
    }

    pub fn delete_todo(&mut self, todo_id: &str) -> Result<(), ProjectError> {
        let position = self.todos.iter()
            .position(|todo| todo.id == todo_id)
            .ok_or_else(|| ProjectError::NotFound {
                entity: "Todo".to_string(),
                id: todo_id.to_string(),
            })?;

        self.todos.remove(position);
        self.touch();
        Ok(())
    }

    /// Flips a todo; completing it completes every subtask with it.
    pub fn toggle_todo(&mut self, todo_id: &str) -> Result<bool, ProjectError> {
        let todo = self.find_todo(todo_id)?;

        todo.completed = !todo.completed;
        if todo.completed {
            for subtask in &mut todo.subtasks {
                subtask.completed = true;
            }
        }
        let completed = todo.completed;

        self.touch();
        Ok(completed)
    }

    // === Subtask Management ===
    pub fn add_subtask(&mut self, todo_id: &str, name: String) -> Result<SubtaskId, ProjectError> {
        Self::validate_item_name(&name)?;

        let now = env::block_timestamp();
        let todo = self.find_todo(todo_id)?;

        let subtask_id = format!("subtask-{}-{}", now, todo.subtasks.len());
        todo.subtasks.push(ProjectTodoSubtask {
            id: subtask_id.clone(),
            name,
            completed: false,
        });
        // A fresh incomplete subtask reopens a completed todo.
        todo.completed = false;

        self.touch();
        Ok(subtask_id)
    }

    pub fn update_subtask(
        &mut self,
        todo_id: &str,
        subtask_id: &str,
        name: String,
    ) -> Result<(), ProjectError> {
        Self::validate_item_name(&name)?;

        let subtask = self.find_subtask(todo_id, subtask_id)?;
        subtask.name = name;

        self.touch();
        Ok(())
    }

    pub fn delete_subtask(&mut self, todo_id: &str, subtask_id: &str) -> Result<(), ProjectError> {
        let todo = self.find_todo(todo_id)?;
        let position = todo.subtasks.iter()
            .position(|subtask| subtask.id == subtask_id)
            .ok_or_else(|| ProjectError::NotFound {
                entity: "Subtask".to_string(),
                id: subtask_id.to_string(),
            })?;

        todo.subtasks.remove(position);
        self.touch();
        Ok(())
    }

    /// Flips a subtask; the owning todo completes exactly when all of its
    /// subtasks are completed.
    pub fn toggle_subtask(&mut self, todo_id: &str, subtask_id: &str) -> Result<bool, ProjectError> {
        let todo = self.find_todo(todo_id)?;
        let subtask = todo.subtasks.iter_mut()
            .find(|subtask| subtask.id == subtask_id)
            .ok_or_else(|| ProjectError::NotFound {
                entity: "Subtask".to_string(),
                id: subtask_id.to_string(),
            })?;

        subtask.completed = !subtask.completed;
        let completed = subtask.completed;
        todo.completed = todo.subtasks.iter().all(|subtask| subtask.completed);

        self.touch();
        Ok(completed)
    }

    // === Completion ===

    /// Marks the project completed and produces its archival record.
    /// `total_points` is the caller-computed snapshot (stage points, todo
    /// points, completion bonus); it is stored on both sides and never
    /// recomputed.
    pub fn complete(
        &mut self,
        completion_notes: Option<String>,
        total_points: u32,
    ) -> Result<CompletedProject, ProjectError> {
        if self.is_completed {
            return Err(ProjectStateError::AlreadyCompleted {
                project_id: self.id.clone(),
            }.into());
        }

        let now = env::block_timestamp();
        let duration_days = now.saturating_sub(self.created_at).div_ceil(NANOS_PER_DAY) as u32;

        self.is_completed = true;
        self.progress = 100;
        self.completed_at = Some(now);
        self.completion_notes = completion_notes.clone();
        self.total_points = Some(total_points);
        self.updated_at = now;

        Ok(CompletedProject {
            id: format!("completed-{}-{}", self.owner_id, now),
            original_project_id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            progress: 100,
            priority: self.priority,
            tags: self.tags.clone(),
            completed_at: now,
            completion_notes,
            total_points,
            total_stages: self.stages.len() as u32,
            total_todos: self.todos.len() as u32,
            deadline: self.deadline.clone(),
            duration_days,
            owner_id: self.owner_id.clone(),
        })
    }

    fn find_todo(&mut self, todo_id: &str) -> Result<&mut ProjectTodo, ProjectError> {
        self.todos.iter_mut()
            .find(|todo| todo.id == todo_id)
            .ok_or_else(|| ProjectError::NotFound {
                entity: "Todo".to_string(),
                id: todo_id.to_string(),
            })
    }

    fn find_subtask(
        &mut self,
        todo_id: &str,
        subtask_id: &str,
    ) -> Result<&mut ProjectTodoSubtask, ProjectError> {
        let todo = self.todos.iter_mut()
            .find(|todo| todo.id == todo_id)
            .ok_or_else(|| ProjectError::NotFound {
                entity: "Todo".to_string(),
                id: todo_id.to_string(),
            })?;

        todo.subtasks.iter_mut()
            .find(|subtask| subtask.id == subtask_id)
            .ok_or_else(|| ProjectError::NotFound {
                entity: "Subtask".to_string(),
                id: subtask_id.to_string(),
            })
    }
}

impl ProjectValidation for Project {
    fn validate_name(&mut self) -> Result<(), ProjectValidationError> {
        if self.name.is_empty() {
            return Err(ProjectValidationError::Name {
                reason: ProjectNameError::Empty,
                current_length: 0,
            });
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(ProjectValidationError::Name {
                reason: ProjectNameError::TooLong,
                current_length: self.name.len(),
            });
        }
        if contains_control_characters(&self.name) {
            return Err(ProjectValidationError::Name {
                reason: ProjectNameError::InvalidCharacters,
                current_length: self.name.len(),
            });
        }
        self.name = self.name.trim().to_string();
        Ok(())
    }

    fn validate_description(&mut self) -> Result<(), ProjectValidationError> {
        if self.description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(ProjectValidationError::Description {
                reason: ProjectDescriptionError::TooLong,
                current_length: self.description.len(),
            });
        }
        if contains_control_characters(&self.description) {
            return Err(ProjectValidationError::Description {
                reason: ProjectDescriptionError::InvalidCharacters,
                current_length: self.description.len(),
            });
        }
        self.description = self.description.trim().to_string();
        Ok(())
    }

    fn validate_deadline(&self) -> Result<(), ProjectValidationError> {
        if let Some(ref deadline) = self.deadline {
            if date::parse_date(deadline).is_none() {
                return Err(ProjectValidationError::Deadline {
                    reason: ProjectDateError::InvalidFormat,
                    provided_date: deadline.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Ownable for Project {
    fn get_owner_id(&self) -> &AccountId {
        &self.owner_id
    }
}

impl Ownable for CompletedProject {
    fn get_owner_id(&self) -> &AccountId {
        &self.owner_id
    }
}

impl Storable for Project {
    const BASE_STORAGE: u64 = PROJECT_BASE_STORAGE;
    const MAX_STORAGE: u64 = PROJECT_MAX_STORAGE;

    fn calculate_storage_metrics(&self) -> StorageMetrics {
        let stage_size = self.stages.iter()
            .map(|stage| {
                stage.id.len() as u64 +
                stage.name.len() as u64 +
                stage.comments.as_ref().map_or(0, |c| c.len() as u64) +
                24
            })
            .sum::<u64>();
        let todo_size = self.todos.iter()
            .map(|todo| {
                todo.id.len() as u64 +
                todo.name.len() as u64 +
                todo.subtasks.iter()
                    .map(|subtask| subtask.id.len() as u64 + subtask.name.len() as u64 + 1)
                    .sum::<u64>() +
                1
            })
            .sum::<u64>();

        let dynamic_size =
            self.id.len() as u64 +
            self.name.len() as u64 +
            self.description.len() as u64 +
            self.deadline.as_ref().map_or(0, |d| d.len() as u64) +
            self.completion_notes.as_ref().map_or(0, |n| n.len() as u64) +
            self.tags.iter().map(|tag| tag.len() as u64).sum::<u64>() +
            self.owner_id.to_string().len() as u64 +
            stage_size +
            todo_size;

        StorageMetrics::from_dynamic_size(Self::BASE_STORAGE, dynamic_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use near_sdk::test_utils::{accounts, VMContextBuilder};
    use near_sdk::testing_env;

    fn setup(timestamp_ns: u64) {
        let mut builder = VMContextBuilder::new();
        builder
            .current_account_id(accounts(0))
            .predecessor_account_id(accounts(1))
            .block_timestamp(timestamp_ns);
        testing_env!(builder.build());
    }

    fn project() -> Project {
        Project::new(
            "Side project".to_string(),
            "A small build".to_string(),
            None,
            Priority::Medium,
            vec!["rust".to_string()],
            accounts(1),
        ).unwrap()
    }

    #[test]
    fn progress_tracks_completed_stage_share() {
        setup(0);
        let mut project = project();
        let first = project.add_stage("Design".to_string(), 20, None, 20).unwrap();
        project.add_stage("Build".to_string(), 30, None, 20).unwrap();
        project.add_stage("Ship".to_string(), 0, None, 20).unwrap();
        assert_eq!(project.progress, 0);

        project.toggle_stage(&first, None).unwrap();
        // 1 of 3, rounded.
        assert_eq!(project.progress, 33);
    }

    #[test]
    fn zero_stage_points_fall_back_to_configured_value() {
        setup(0);
        let mut project = project();
        project.add_stage("Ship".to_string(), 0, None, 20).unwrap();
        assert_eq!(project.stages[0].points, 20);
    }

    #[test]
    fn deleting_a_stage_reorders_the_rest() {
        setup(0);
        let mut project = project();
        let first = project.add_stage("Design".to_string(), 20, None, 20).unwrap();
        setup(1);
        project.add_stage("Build".to_string(), 30, None, 20).unwrap();

        project.delete_stage(&first).unwrap();
        assert_eq!(project.stages.len(), 1);
        assert_eq!(project.stages[0].order, 0);
    }

    #[test]
    fn completing_last_subtask_completes_the_todo() {
        setup(0);
        let mut project = project();
        let todo = project.add_todo("Checklist".to_string()).unwrap();
        let first = project.add_subtask(&todo, "One".to_string()).unwrap();
        setup(1);
        let second = project.add_subtask(&todo, "Two".to_string()).unwrap();

        project.toggle_subtask(&todo, &first).unwrap();
        assert!(!project.todos[0].completed);

        project.toggle_subtask(&todo, &second).unwrap();
        assert!(project.todos[0].completed);
    }

    #[test]
    fn completing_a_todo_completes_its_subtasks() {
        setup(0);
        let mut project = project();
        let todo = project.add_todo("Checklist".to_string()).unwrap();
        project.add_subtask(&todo, "One".to_string()).unwrap();

        project.toggle_todo(&todo).unwrap();
        assert!(project.todos[0].completed);
        assert!(project.todos[0].subtasks[0].completed);
    }

    #[test]
    fn completion_snapshots_and_rejects_repeats() {
        setup(0);
        let mut project = project();

        setup(3 * NANOS_PER_DAY + 1);
        let record = project.complete(Some("done".to_string()), 60).unwrap();
        assert!(project.is_completed);
        assert_eq!(project.progress, 100);
        assert_eq!(project.total_points, Some(60));
        assert_eq!(record.total_points, 60);
        assert_eq!(record.duration_days, 4);

        assert!(matches!(
            project.complete(None, 60),
            Err(ProjectError::State(ProjectStateError::AlreadyCompleted { .. }))
        ));
    }

    #[test]
    fn unknown_stage_is_not_found() {
        setup(0);
        let mut project = project();
        assert!(matches!(
            project.toggle_stage("stage-0-0", None),
            Err(ProjectError::NotFound { .. })
        ));
    }
}
