use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use near_sdk::{
    near, env, PanicOnDefault, AccountId,
    collections::{LookupMap, UnorderedMap, UnorderedSet},
};

pub mod models;
use crate::models::{
    Habit, HabitId, HabitFrequency,
    HabitError,

    Task, TaskId, Priority,
    TaskError,

    Project, ProjectId, StageId, TodoId, SubtaskId, CompletedProject,
    ProjectError, ProjectStateError,

    Note, NoteId, NoteCategory, NoteError,

    ScoringSettings, SettingsError,

    BadgeRank, LevelProgress, ScoringSnapshot, HabitStats, ProjectStatistics,

    StorageError, OwnershipError, Ownable, Storable,
};
use crate::models::{date, scoring};

// === Core Enums ===
#[derive(Debug)]
pub enum IndexType {
    Habit,
    Task,
    Project,
    CompletedProject,
    Note,
}

// === Return Types ===
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, JsonSchema, Clone)]
#[serde(crate = "near_sdk::serde")]
pub enum Response<T, E> {
    Success(T),
    Error(E)
}

impl<T, E> Response<T, E> {
    pub fn map_err<F, E2>(self, f: F) -> Response<T, E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Response::Success(t) => Response::Success(t),
            Response::Error(e) => Response::Error(f(e)),
        }
    }

    pub fn from_result<E2>(result: Result<T, E2>, error_mapper: impl FnOnce(E2) -> E) -> Self {
        match result {
            Ok(t) => Response::Success(t),
            Err(e) => Response::Error(error_mapper(e)),
        }
    }
}

// === Core Error Types ===
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, JsonSchema, Clone, Debug)]
#[serde(crate = "near_sdk::serde")]
pub enum ContractError {
    ValidationError(String, String, Option<String>), // entity, message, details
    StorageError(StorageError),
    AccessError(OwnershipError),
    StateError(String, String, String, String), // entity, current_state, attempted_action, message
    NotFound(String, String), // entity, id
    Operation(String) // error message
}

// === Type aliases for response types ===
pub type HabitResponse = Response<Habit, ContractError>;
pub type HabitListResponse = Response<Vec<Habit>, ContractError>;
pub type HabitActionResponse = Response<HabitId, ContractError>;
pub type HabitStatsResponse = Response<HabitStats, ContractError>;
pub type StreakResponse = Response<u32, ContractError>;

pub type TaskListResponse = Response<Vec<Task>, ContractError>;
pub type TaskActionResponse = Response<TaskId, ContractError>;

pub type ProjectResponse = Response<Project, ContractError>;
pub type ProjectListResponse = Response<Vec<Project>, ContractError>;
pub type ProjectActionResponse = Response<ProjectId, ContractError>;
pub type CompletedProjectListResponse = Response<Vec<CompletedProject>, ContractError>;
pub type ProjectStatisticsResponse = Response<ProjectStatistics, ContractError>;

pub type NoteListResponse = Response<Vec<Note>, ContractError>;
pub type NoteActionResponse = Response<NoteId, ContractError>;

pub type SettingsResponse = Response<ScoringSettings, ContractError>;

pub type PointsResponse = Response<u32, ContractError>;
pub type SnapshotResponse = Response<ScoringSnapshot, ContractError>;
pub type BadgeResponse = Response<BadgeRank, ContractError>;
pub type LevelResponse = Response<LevelProgress, ContractError>;

// === Error Conversion Implementations ===
impl From<StorageError> for ContractError {
    fn from(err: StorageError) -> Self {
        ContractError::StorageError(err)
    }
}

impl From<OwnershipError> for ContractError {
    fn from(err: OwnershipError) -> Self {
        ContractError::AccessError(err)
    }
}

impl From<HabitError> for ContractError {
    fn from(err: HabitError) -> Self {
        match err {
            HabitError::Validation(err) => ContractError::ValidationError(
                "Habit".to_string(),
                err.to_string(),
                None
            ),
            HabitError::Storage(err) => ContractError::StorageError(err),
            HabitError::Access(err) => ContractError::AccessError(err),
        }
    }
}

impl From<TaskError> for ContractError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Validation(err) => ContractError::ValidationError(
                "Task".to_string(),
                err.to_string(),
                None
            ),
            TaskError::Storage(err) => ContractError::StorageError(err),
            TaskError::Access(err) => ContractError::AccessError(err),
        }
    }
}

impl From<ProjectError> for ContractError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::Validation(err) => ContractError::ValidationError(
                "Project".to_string(),
                err.to_string(),
                None
            ),
            ProjectError::Storage(err) => ContractError::StorageError(err),
            ProjectError::Access(err) => ContractError::AccessError(err),
            ProjectError::State(ProjectStateError::AlreadyCompleted { project_id }) => {
                ContractError::StateError(
                    "Project".to_string(),
                    "Completed".to_string(),
                    "complete".to_string(),
                    format!("Project {} is already completed", project_id)
                )
            },
            ProjectError::NotFound { entity, id } => ContractError::NotFound(entity, id),
        }
    }
}

impl From<NoteError> for ContractError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::Validation(err) => ContractError::ValidationError(
                "Note".to_string(),
                err.to_string(),
                None
            ),
            NoteError::Storage(err) => ContractError::StorageError(err),
            NoteError::Access(err) => ContractError::AccessError(err),
        }
    }
}

impl From<SettingsError> for ContractError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Validation(err) => ContractError::ValidationError(
                "Settings".to_string(),
                err.to_string(),
                None
            ),
        }
    }
}

// === Error Display Implementations ===
impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidationError(entity, message, details) => {
                if let Some(detail) = details {
                    write!(f, "{} validation error: {} ({})", entity, message, detail)
                } else {
                    write!(f, "{} validation error: {}", entity, message)
                }
            },
            Self::StorageError(err) => write!(f, "Storage error: {}", err),
            Self::AccessError(err) => write!(f, "Access error: {}", err),
            Self::StateError(entity, current_state, attempted_action, message) => {
                write!(f, "{} state error: {} (current state: {}, attempted: {})",
                    entity, message, current_state, attempted_action)
            },
            Self::NotFound(entity, id) => write!(f, "{} not found: {}", entity, id),
            Self::Operation(err) => write!(f, "Operation error: {}", err)
        }
    }
}

// === Core Data Structures ===
#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    habits: UnorderedMap<HabitId, Habit>,
    habits_per_owner: LookupMap<AccountId, UnorderedSet<HabitId>>,
    tasks: UnorderedMap<TaskId, Task>,
    tasks_per_owner: LookupMap<AccountId, UnorderedSet<TaskId>>,
    projects: UnorderedMap<ProjectId, Project>,
    projects_per_owner: LookupMap<AccountId, UnorderedSet<ProjectId>>,
    completed_projects: UnorderedMap<String, CompletedProject>,
    completed_projects_per_owner: LookupMap<AccountId, UnorderedSet<String>>,
    notes: UnorderedMap<NoteId, Note>,
    notes_per_owner: LookupMap<AccountId, UnorderedSet<NoteId>>,
    unique_records: LookupMap<AccountId, Vec<Task>>,
    settings: LookupMap<AccountId, ScoringSettings>,
}


#[near]
impl Contract {
    #[init]
    pub fn new() -> Self {
        Self {
            habits: UnorderedMap::new(b"h".to_vec()),
            habits_per_owner: LookupMap::new(b"ho".to_vec()),
            tasks: UnorderedMap::new(b"t".to_vec()),
            tasks_per_owner: LookupMap::new(b"to".to_vec()),
            projects: UnorderedMap::new(b"p".to_vec()),
            projects_per_owner: LookupMap::new(b"po".to_vec()),
            completed_projects: UnorderedMap::new(b"c".to_vec()),
            completed_projects_per_owner: LookupMap::new(b"co".to_vec()),
            notes: UnorderedMap::new(b"n".to_vec()),
            notes_per_owner: LookupMap::new(b"no".to_vec()),
            unique_records: LookupMap::new(b"u".to_vec()),
            settings: LookupMap::new(b"s".to_vec()),
        }
    }

    fn add_to_owner_index(&mut self, owner_id: &AccountId, id: &str, index_type: IndexType) {
        match index_type {
            IndexType::Habit => {
                let mut habit_set = self.habits_per_owner
                    .get(owner_id)
                    .unwrap_or_else(|| UnorderedSet::new(format!("ho{}", owner_id).as_bytes()));
                habit_set.insert(&id.to_string());
                self.habits_per_owner.insert(owner_id, &habit_set);
            },
            IndexType::Task => {
                let mut task_set = self.tasks_per_owner
                    .get(owner_id)
                    .unwrap_or_else(|| UnorderedSet::new(format!("to{}", owner_id).as_bytes()));
                task_set.insert(&id.to_string());
                self.tasks_per_owner.insert(owner_id, &task_set);
            },
            IndexType::Project => {
                let mut project_set = self.projects_per_owner
                    .get(owner_id)
                    .unwrap_or_else(|| UnorderedSet::new(format!("po{}", owner_id).as_bytes()));
                project_set.insert(&id.to_string());
                self.projects_per_owner.insert(owner_id, &project_set);
            },
            IndexType::CompletedProject => {
                let mut completed_set = self.completed_projects_per_owner
                    .get(owner_id)
                    .unwrap_or_else(|| UnorderedSet::new(format!("co{}", owner_id).as_bytes()));
                completed_set.insert(&id.to_string());
                self.completed_projects_per_owner.insert(owner_id, &completed_set);
            },
            IndexType::Note => {
                let mut note_set = self.notes_per_owner
                    .get(owner_id)
                    .unwrap_or_else(|| UnorderedSet::new(format!("no{}", owner_id).as_bytes()));
                note_set.insert(&id.to_string());
                self.notes_per_owner.insert(owner_id, &note_set);
            },
        }
    }

    fn remove_from_owner_index(&mut self, owner_id: &AccountId, id: &str, index_type: IndexType) {
        match index_type {
            IndexType::Habit => {
                if let Some(mut habit_set) = self.habits_per_owner.get(owner_id) {
                    habit_set.remove(&id.to_string());
                    self.habits_per_owner.insert(owner_id, &habit_set);
                }
            },
            IndexType::Task => {
                if let Some(mut task_set) = self.tasks_per_owner.get(owner_id) {
                    task_set.remove(&id.to_string());
                    self.tasks_per_owner.insert(owner_id, &task_set);
                }
            },
            IndexType::Project => {
                if let Some(mut project_set) = self.projects_per_owner.get(owner_id) {
                    project_set.remove(&id.to_string());
                    self.projects_per_owner.insert(owner_id, &project_set);
                }
            },
            IndexType::CompletedProject => {
                if let Some(mut completed_set) = self.completed_projects_per_owner.get(owner_id) {
                    completed_set.remove(&id.to_string());
                    self.completed_projects_per_owner.insert(owner_id, &completed_set);
                }
            },
            IndexType::Note => {
                if let Some(mut note_set) = self.notes_per_owner.get(owner_id) {
                    note_set.remove(&id.to_string());
                    self.notes_per_owner.insert(owner_id, &note_set);
                }
            },
        }
    }

    // === Collection Snapshots ===
    // Scoring reads complete, possibly empty snapshots; the list getters
    // below keep the NotFound behavior for callers that want it.
    fn collect_habits(&self, owner_id: &AccountId) -> Vec<Habit> {
        self.habits_per_owner.get(owner_id)
            .map(|set| set.iter().filter_map(|id| self.habits.get(&id)).collect())
            .unwrap_or_default()
    }

    fn collect_tasks(&self, owner_id: &AccountId) -> Vec<Task> {
        self.tasks_per_owner.get(owner_id)
            .map(|set| set.iter().filter_map(|id| self.tasks.get(&id)).collect())
            .unwrap_or_default()
    }

    fn collect_projects(&self, owner_id: &AccountId) -> Vec<Project> {
        self.projects_per_owner.get(owner_id)
            .map(|set| set.iter().filter_map(|id| self.projects.get(&id)).collect())
            .unwrap_or_default()
    }

    fn collect_completed_projects(&self, owner_id: &AccountId) -> Vec<CompletedProject> {
        self.completed_projects_per_owner.get(owner_id)
            .map(|set| set.iter().filter_map(|id| self.completed_projects.get(&id)).collect())
            .unwrap_or_default()
    }

    fn settings_for(&self, owner_id: &AccountId) -> ScoringSettings {
        self.settings.get(owner_id).unwrap_or_default()
    }

    fn today(&self) -> date::EpochDay {
        date::epoch_day_from_timestamp(env::block_timestamp())
    }

    // === Scoring ===

    /// Recomputes the full scoring snapshot for an account: total points,
    /// level, progress to the next level, and badge rank.
    pub fn get_scoring_snapshot(&self, owner_id: AccountId) -> SnapshotResponse {
        let habits = self.collect_habits(&owner_id);
        let tasks = self.collect_tasks(&owner_id);
        let projects = self.collect_projects(&owner_id);
        let completed_projects = self.collect_completed_projects(&owner_id);
        let settings = self.settings_for(&owner_id);

        Response::Success(scoring::recompute_scoring(
            &habits,
            &tasks,
            &projects,
            &completed_projects,
            &settings,
        ))
    }

    pub fn get_total_points(&self, owner_id: AccountId) -> PointsResponse {
        match self.get_scoring_snapshot(owner_id) {
            Response::Success(snapshot) => Response::Success(snapshot.total_points),
            Response::Error(e) => Response::Error(e),
        }
    }

    pub fn get_badge(&self, owner_id: AccountId) -> BadgeResponse {
        match self.get_scoring_snapshot(owner_id) {
            Response::Success(snapshot) => Response::Success(snapshot.badge),
            Response::Error(e) => Response::Error(e),
        }
    }

    pub fn get_level(&self, owner_id: AccountId) -> LevelResponse {
        match self.get_scoring_snapshot(owner_id) {
            Response::Success(snapshot) => Response::Success(LevelProgress {
                level: snapshot.level,
                next_level_percentage: snapshot.next_level_percentage,
            }),
            Response::Error(e) => Response::Error(e),
        }
    }

    // === Habit Management ===
    pub fn get_habits_by_owner(&self, owner_id: AccountId) -> HabitListResponse {
        let habits = self.collect_habits(&owner_id);

        if habits.is_empty() {
            return Response::Error(ContractError::NotFound(
                "Habit".to_string(),
                format!("No habits found for {}", owner_id)
            ));
        }

        Response::Success(habits)
    }

    pub fn add_habit(
        &mut self,
        name: String,
        frequency: HabitFrequency,
        color: String,
    ) -> HabitActionResponse {
        let owner_id = env::predecessor_account_id();

        let habit = match Habit::new(name, frequency, color, owner_id.clone()) {
            Ok(habit) => habit,
            Err(e) => return Response::Error(e.into())
        };

        let habit_id = habit.id.clone();
        self.habits.insert(&habit_id, &habit);
        self.add_to_owner_index(&owner_id, &habit_id, IndexType::Habit);

        env::log_str(&format!("Created habit {}", habit_id));
        Response::Success(habit_id)
    }

    pub fn update_habit(
        &mut self,
        habit_id: HabitId,
        name: Option<String>,
        frequency: Option<HabitFrequency>,
        color: Option<String>,
    ) -> HabitActionResponse {
        let mut habit = match self.habits.get(&habit_id) {
            Some(h) => h,
            None => return Response::Error(ContractError::NotFound(
                "Habit".to_string(),
                format!("Habit {} not found", habit_id)
            ))
        };

        if let Err(e) = habit.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Some(name) = name {
            habit.name = name;
        }
        if let Some(frequency) = frequency {
            habit.frequency = frequency;
        }
        if let Some(color) = color {
            habit.color = color;
        }

        if let Err(e) = habit.validate() {
            return Response::Error(e.into());
        }

        self.habits.insert(&habit_id, &habit);
        Response::Success(habit_id)
    }

    pub fn delete_habit(&mut self, habit_id: HabitId) -> HabitActionResponse {
        let habit = match self.habits.get(&habit_id) {
            Some(h) => h,
            None => return Response::Error(ContractError::NotFound(
                "Habit".to_string(),
                format!("Habit {} not found", habit_id)
            ))
        };

        if let Err(e) = habit.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        self.habits.remove(&habit_id);
        self.remove_from_owner_index(habit.get_owner_id(), &habit_id, IndexType::Habit);

        env::log_str(&format!("Deleted habit {}", habit_id));
        Response::Success(habit_id)
    }

    pub fn toggle_habit_completion(&mut self, habit_id: HabitId, date: String) -> HabitActionResponse {
        let mut habit = match self.habits.get(&habit_id) {
            Some(h) => h,
            None => return Response::Error(ContractError::NotFound(
                "Habit".to_string(),
                format!("Habit {} not found", habit_id)
            ))
        };

        if let Err(e) = habit.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        let completed = match habit.toggle_completion(&date) {
            Ok(state) => state,
            Err(e) => return Response::Error(e.into())
        };

        if let Err(e) = habit.validate_storage() {
            return Response::Error(e.into());
        }

        self.habits.insert(&habit_id, &habit);
        env::log_str(&format!(
            "Habit {} marked {} for {}",
            habit_id,
            if completed { "completed" } else { "not completed" },
            date
        ));
        Response::Success(habit_id)
    }

    pub fn toggle_habit_failed(&mut self, habit_id: HabitId, date: String) -> HabitActionResponse {
        let mut habit = match self.habits.get(&habit_id) {
            Some(h) => h,
            None => return Response::Error(ContractError::NotFound(
                "Habit".to_string(),
                format!("Habit {} not found", habit_id)
            ))
        };

        if let Err(e) = habit.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Err(e) = habit.toggle_failed(&date) {
            return Response::Error(e.into());
        }

        if let Err(e) = habit.validate_storage() {
            return Response::Error(e.into());
        }

        self.habits.insert(&habit_id, &habit);
        Response::Success(habit_id)
    }

    pub fn get_habit_streak(&self, habit_id: HabitId) -> StreakResponse {
        let habit = match self.habits.get(&habit_id) {
            Some(h) => h,
            None => return Response::Error(ContractError::NotFound(
                "Habit".to_string(),
                format!("Habit {} not found", habit_id)
            ))
        };

        Response::Success(scoring::current_streak(&habit.history, self.today()))
    }

    pub fn get_habit_stats(&self, habit_id: HabitId) -> HabitStatsResponse {
        let habit = match self.habits.get(&habit_id) {
            Some(h) => h,
            None => return Response::Error(ContractError::NotFound(
                "Habit".to_string(),
                format!("Habit {} not found", habit_id)
            ))
        };

        Response::Success(scoring::habit_stats(&habit, self.today()))
    }

    // === Task Management ===
    pub fn get_tasks_by_owner(&self, owner_id: AccountId) -> TaskListResponse {
        let tasks = self.collect_tasks(&owner_id);

        if tasks.is_empty() {
            return Response::Error(ContractError::NotFound(
                "Task".to_string(),
                format!("No tasks found for {}", owner_id)
            ));
        }

        Response::Success(tasks)
    }

    pub fn get_tasks_for_date(&self, owner_id: AccountId, date: String) -> TaskListResponse {
        let tasks: Vec<Task> = self.collect_tasks(&owner_id)
            .into_iter()
            .filter(|task| task.date == date)
            .collect();

        if tasks.is_empty() {
            return Response::Error(ContractError::NotFound(
                "Task".to_string(),
                format!("No tasks found for {} on {}", owner_id, date)
            ));
        }

        Response::Success(tasks)
    }

    /// Snapshots of remembered tasks, archived at completion time.
    pub fn get_unique_records(&self, owner_id: AccountId) -> TaskListResponse {
        Response::Success(self.unique_records.get(&owner_id).unwrap_or_default())
    }

    pub fn add_task(
        &mut self,
        name: String,
        date: String,
        remember: Option<bool>,
        custom_points: Option<u32>,
        priority: Option<Priority>,
        color: Option<String>,
    ) -> TaskActionResponse {
        let owner_id = env::predecessor_account_id();

        let task = match Task::new(
            name,
            date,
            remember.unwrap_or(false),
            custom_points,
            priority,
            color,
            owner_id.clone()
        ) {
            Ok(task) => task,
            Err(e) => return Response::Error(e.into())
        };

        let task_id = task.id.clone();
        self.tasks.insert(&task_id, &task);
        self.add_to_owner_index(&owner_id, &task_id, IndexType::Task);

        env::log_str(&format!("Created task {}", task_id));
        Response::Success(task_id)
    }

    pub fn update_task(
        &mut self,
        task_id: TaskId,
        name: String,
        date: String,
        remember: Option<bool>,
        custom_points: Option<u32>,
        priority: Option<Priority>,
        color: Option<String>,
    ) -> TaskActionResponse {
        let mut task = match self.tasks.get(&task_id) {
            Some(t) => t,
            None => return Response::Error(ContractError::NotFound(
                "Task".to_string(),
                format!("Task {} not found", task_id)
            ))
        };

        if let Err(e) = task.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        task.name = name;
        task.date = date;
        task.remember = remember.unwrap_or(task.remember);
        task.custom_points = custom_points;
        task.priority = priority;
        task.color = color;

        if let Err(e) = task.validate() {
            return Response::Error(e.into());
        }

        self.tasks.insert(&task_id, &task);
        Response::Success(task_id)
    }

    pub fn delete_task(&mut self, task_id: TaskId) -> TaskActionResponse {
        let task = match self.tasks.get(&task_id) {
            Some(t) => t,
            None => return Response::Error(ContractError::NotFound(
                "Task".to_string(),
                format!("Task {} not found", task_id)
            ))
        };

        if let Err(e) = task.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        self.tasks.remove(&task_id);
        self.remove_from_owner_index(task.get_owner_id(), &task_id, IndexType::Task);

        env::log_str(&format!("Deleted task {}", task_id));
        Response::Success(task_id)
    }

    pub fn toggle_task_completion(&mut self, task_id: TaskId) -> TaskActionResponse {
        let mut task = match self.tasks.get(&task_id) {
            Some(t) => t,
            None => return Response::Error(ContractError::NotFound(
                "Task".to_string(),
                format!("Task {} not found", task_id)
            ))
        };

        if let Err(e) = task.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        let completed = task.toggle_completion();

        if completed && task.remember {
            let owner_id = env::predecessor_account_id();
            let mut records = self.unique_records.get(&owner_id).unwrap_or_default();
            records.push(task.clone());
            self.unique_records.insert(&owner_id, &records);
        }

        self.tasks.insert(&task_id, &task);
        env::log_str(&format!(
            "Task {} {}",
            task_id,
            if completed { "completed" } else { "reopened" }
        ));
        Response::Success(task_id)
    }

    pub fn toggle_task_incomplete(&mut self, task_id: TaskId) -> TaskActionResponse {
        let mut task = match self.tasks.get(&task_id) {
            Some(t) => t,
            None => return Response::Error(ContractError::NotFound(
                "Task".to_string(),
                format!("Task {} not found", task_id)
            ))
        };

        if let Err(e) = task.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        task.toggle_incomplete();

        self.tasks.insert(&task_id, &task);
        Response::Success(task_id)
    }

    pub fn toggle_task_failed(&mut self, task_id: TaskId) -> TaskActionResponse {
        let mut task = match self.tasks.get(&task_id) {
            Some(t) => t,
            None => return Response::Error(ContractError::NotFound(
                "Task".to_string(),
                format!("Task {} not found", task_id)
            ))
        };

        if let Err(e) = task.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        let failed = task.toggle_failed();

        self.tasks.insert(&task_id, &task);
        env::log_str(&format!(
            "Task {} {}",
            task_id,
            if failed { "marked failed" } else { "failure cleared" }
        ));
        Response::Success(task_id)
    }

    // === Project Management ===
    pub fn get_projects_by_owner(&self, owner_id: AccountId) -> ProjectListResponse {
        let projects = self.collect_projects(&owner_id);

        if projects.is_empty() {
            return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("No projects found for {}", owner_id)
            ));
        }

        Response::Success(projects)
    }

    pub fn get_completed_projects(&self, owner_id: AccountId) -> CompletedProjectListResponse {
        Response::Success(self.collect_completed_projects(&owner_id))
    }

    pub fn get_project_statistics(&self, owner_id: AccountId) -> ProjectStatisticsResponse {
        let projects = self.collect_projects(&owner_id);
        let completed_projects = self.collect_completed_projects(&owner_id);
        let settings = self.settings_for(&owner_id);

        Response::Success(scoring::project_statistics(&projects, &completed_projects, &settings))
    }

    pub fn add_project(
        &mut self,
        name: String,
        description: String,
        deadline: Option<String>,
        priority: Option<Priority>,
        tags: Option<Vec<String>>,
    ) -> ProjectActionResponse {
        let owner_id = env::predecessor_account_id();

        let project = match Project::new(
            name,
            description,
            deadline,
            priority.unwrap_or(Priority::Medium),
            tags.unwrap_or_default(),
            owner_id.clone()
        ) {
            Ok(project) => project,
            Err(e) => return Response::Error(e.into())
        };

        let project_id = project.id.clone();
        self.projects.insert(&project_id, &project);
        self.add_to_owner_index(&owner_id, &project_id, IndexType::Project);

        env::log_str(&format!("Created project {}", project_id));
        Response::Success(project_id)
    }

    pub fn update_project(
        &mut self,
        project_id: ProjectId,
        name: Option<String>,
        description: Option<String>,
        deadline: Option<String>,
        priority: Option<Priority>,
        tags: Option<Vec<String>>,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Some(name) = name {
            project.name = name;
        }
        if let Some(description) = description {
            project.description = description;
        }
        if let Some(deadline) = deadline {
            project.deadline = Some(deadline);
        }
        if let Some(priority) = priority {
            project.priority = priority;
        }
        if let Some(tags) = tags {
            project.tags = tags;
        }
        project.updated_at = env::block_timestamp();

        if let Err(e) = project.validate() {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(project_id)
    }

    /// Deletes a project and every note bound to it. The archival record of
    /// a completed project, if any, stays.
    pub fn delete_project(&mut self, project_id: ProjectId) -> ProjectActionResponse {
        let project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        let owner_id = project.get_owner_id().clone();

        let bound_notes: Vec<NoteId> = self.notes_per_owner.get(&owner_id)
            .map(|set| {
                set.iter()
                    .filter(|note_id| {
                        self.notes.get(note_id)
                            .map_or(false, |note| note.project_id.as_deref() == Some(project_id.as_str()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        for note_id in bound_notes {
            self.notes.remove(&note_id);
            self.remove_from_owner_index(&owner_id, &note_id, IndexType::Note);
        }

        self.projects.remove(&project_id);
        self.remove_from_owner_index(&owner_id, &project_id, IndexType::Project);

        env::log_str(&format!("Deleted project {}", project_id));
        Response::Success(project_id)
    }

    /// Marks a project completed: takes the points snapshot (stages, todos,
    /// completion bonus), stamps the duration, and appends the archival
    /// record. The project itself stays in the active list, flagged
    /// completed.
    pub fn complete_project(
        &mut self,
        project_id: ProjectId,
        completion_notes: Option<String>,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        let owner_id = project.get_owner_id().clone();
        let settings = self.settings_for(&owner_id);
        let total_points = scoring::completion_snapshot_points(&project, &settings);

        let record = match project.complete(completion_notes, total_points) {
            Ok(record) => record,
            Err(e) => return Response::Error(e.into())
        };

        let record_id = record.id.clone();
        self.projects.insert(&project_id, &project);
        self.completed_projects.insert(&record_id, &record);
        self.add_to_owner_index(&owner_id, &record_id, IndexType::CompletedProject);

        env::log_str(&format!(
            "Completed project {} for {} points",
            project_id, total_points
        ));
        Response::Success(project_id)
    }

    // === Project Stage Management ===
    pub fn add_project_stage(
        &mut self,
        project_id: ProjectId,
        name: String,
        points: Option<u32>,
        comments: Option<String>,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        let settings = self.settings_for(project.get_owner_id());
        let stage_id = match project.add_stage(
            name,
            points.unwrap_or(0),
            comments,
            settings.points_per_project_stage,
        ) {
            Ok(stage_id) => stage_id,
            Err(e) => return Response::Error(e.into())
        };

        if let Err(e) = project.validate_storage() {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(stage_id)
    }

    pub fn update_project_stage(
        &mut self,
        project_id: ProjectId,
        stage_id: StageId,
        name: Option<String>,
        points: Option<u32>,
        comments: Option<String>,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Err(e) = project.update_stage(&stage_id, name, points, comments) {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(stage_id)
    }

    pub fn delete_project_stage(
        &mut self,
        project_id: ProjectId,
        stage_id: StageId,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Err(e) = project.delete_stage(&stage_id) {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(stage_id)
    }

    pub fn toggle_project_stage(
        &mut self,
        project_id: ProjectId,
        stage_id: StageId,
        comments: Option<String>,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        let completed = match project.toggle_stage(&stage_id, comments) {
            Ok(state) => state,
            Err(e) => return Response::Error(e.into())
        };

        self.projects.insert(&project_id, &project);
        env::log_str(&format!(
            "Stage {} of {} {}",
            stage_id,
            project_id,
            if completed { "completed" } else { "reopened" }
        ));
        Response::Success(stage_id)
    }

    // === Project Todo Management ===
    pub fn add_project_todo(
        &mut self,
        project_id: ProjectId,
        name: String,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        let todo_id = match project.add_todo(name) {
            Ok(todo_id) => todo_id,
            Err(e) => return Response::Error(e.into())
        };

        if let Err(e) = project.validate_storage() {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(todo_id)
    }

    pub fn update_project_todo(
        &mut self,
        project_id: ProjectId,
        todo_id: TodoId,
        name: String,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Err(e) = project.update_todo(&todo_id, name) {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(todo_id)
    }

    pub fn delete_project_todo(
        &mut self,
        project_id: ProjectId,
        todo_id: TodoId,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Err(e) = project.delete_todo(&todo_id) {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(todo_id)
    }

    pub fn toggle_project_todo(
        &mut self,
        project_id: ProjectId,
        todo_id: TodoId,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Err(e) = project.toggle_todo(&todo_id) {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(todo_id)
    }

    pub fn add_project_todo_subtask(
        &mut self,
        project_id: ProjectId,
        todo_id: TodoId,
        name: String,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        let subtask_id = match project.add_subtask(&todo_id, name) {
            Ok(subtask_id) => subtask_id,
            Err(e) => return Response::Error(e.into())
        };

        if let Err(e) = project.validate_storage() {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(subtask_id)
    }

    pub fn update_project_todo_subtask(
        &mut self,
        project_id: ProjectId,
        todo_id: TodoId,
        subtask_id: SubtaskId,
        name: String,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Err(e) = project.update_subtask(&todo_id, &subtask_id, name) {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(subtask_id)
    }

    pub fn delete_project_todo_subtask(
        &mut self,
        project_id: ProjectId,
        todo_id: TodoId,
        subtask_id: SubtaskId,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Err(e) = project.delete_subtask(&todo_id, &subtask_id) {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(subtask_id)
    }

    pub fn toggle_project_todo_subtask(
        &mut self,
        project_id: ProjectId,
        todo_id: TodoId,
        subtask_id: SubtaskId,
    ) -> ProjectActionResponse {
        let mut project = match self.projects.get(&project_id) {
            Some(p) => p,
            None => return Response::Error(ContractError::NotFound(
                "Project".to_string(),
                format!("Project {} not found", project_id)
            ))
        };

        if let Err(e) = project.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        if let Err(e) = project.toggle_subtask(&todo_id, &subtask_id) {
            return Response::Error(e.into());
        }

        self.projects.insert(&project_id, &project);
        Response::Success(subtask_id)
    }

    // === Note Management ===
    pub fn get_notes_by_owner(&self, owner_id: AccountId) -> NoteListResponse {
        let notes: Vec<Note> = self.notes_per_owner.get(&owner_id)
            .map(|set| set.iter().filter_map(|id| self.notes.get(&id)).collect())
            .unwrap_or_default();

        if notes.is_empty() {
            return Response::Error(ContractError::NotFound(
                "Note".to_string(),
                format!("No notes found for {}", owner_id)
            ));
        }

        Response::Success(notes)
    }

    pub fn add_note(
        &mut self,
        title: String,
        content: String,
        category: NoteCategory,
        project_id: Option<ProjectId>,
        color: Option<String>,
    ) -> NoteActionResponse {
        let owner_id = env::predecessor_account_id();

        let note = match Note::new(title, content, category, project_id, color, owner_id.clone()) {
            Ok(note) => note,
            Err(e) => return Response::Error(e.into())
        };

        let note_id = note.id.clone();
        self.notes.insert(&note_id, &note);
        self.add_to_owner_index(&owner_id, &note_id, IndexType::Note);

        Response::Success(note_id)
    }

    pub fn update_note(
        &mut self,
        note_id: NoteId,
        title: String,
        content: String,
        color: Option<String>,
    ) -> NoteActionResponse {
        let mut note = match self.notes.get(&note_id) {
            Some(n) => n,
            None => return Response::Error(ContractError::NotFound(
                "Note".to_string(),
                format!("Note {} not found", note_id)
            ))
        };

        if let Err(e) = note.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        note.title = title;
        note.content = content;
        note.color = color;
        note.touch();

        if let Err(e) = note.validate() {
            return Response::Error(e.into());
        }

        self.notes.insert(&note_id, &note);
        Response::Success(note_id)
    }

    pub fn delete_note(&mut self, note_id: NoteId) -> NoteActionResponse {
        let note = match self.notes.get(&note_id) {
            Some(n) => n,
            None => return Response::Error(ContractError::NotFound(
                "Note".to_string(),
                format!("Note {} not found", note_id)
            ))
        };

        if let Err(e) = note.validate_ownership() {
            return Response::Error(ContractError::AccessError(e));
        }

        self.notes.remove(&note_id);
        self.remove_from_owner_index(note.get_owner_id(), &note_id, IndexType::Note);

        Response::Success(note_id)
    }

    // === Settings Management ===

    /// Stored settings for the account, or the documented defaults when none
    /// were ever saved.
    pub fn get_settings(&self, owner_id: AccountId) -> SettingsResponse {
        Response::Success(self.settings_for(&owner_id))
    }

    pub fn update_settings(
        &mut self,
        points_per_habit: Option<u32>,
        points_per_task: Option<u32>,
        points_per_project_stage: Option<u32>,
        level_thresholds: Option<Vec<u32>>,
    ) -> SettingsResponse {
        let owner_id = env::predecessor_account_id();

        let mut settings = self.settings_for(&owner_id);
        settings.merge(
            points_per_habit,
            points_per_task,
            points_per_project_stage,
            level_thresholds,
        );

        if let Err(e) = settings.validate() {
            return Response::Error(e.into());
        }

        self.settings.insert(&owner_id, &settings);
        env::log_str(&format!("Updated scoring settings for {}", owner_id));
        Response::Success(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use near_sdk::test_utils::{accounts, VMContextBuilder};
    use near_sdk::testing_env;

    const DAY_NS: u64 = 24 * 60 * 60 * 1_000_000_000;
    const TODAY: i64 = 20000;

    fn set_context(predecessor: AccountId, timestamp_ns: u64) {
        let mut builder = VMContextBuilder::new();
        builder
            .current_account_id(accounts(0))
            .signer_account_id(predecessor.clone())
            .predecessor_account_id(predecessor)
            .block_timestamp(timestamp_ns);
        testing_env!(builder.build());
    }

    fn today_string() -> String {
        models::date::format_date(TODAY)
    }

    // Distinct timestamps within the same day keep generated ids unique.
    fn at_tick(tick: u64) -> u64 {
        TODAY as u64 * DAY_NS + tick
    }

    fn expect_success<T, E: std::fmt::Debug>(response: Response<T, E>) -> T {
        match response {
            Response::Success(value) => value,
            Response::Error(e) => panic!("expected success, got {:?}", e),
        }
    }

    #[test]
    fn fresh_account_scores_zero_at_level_one() {
        set_context(accounts(1), at_tick(0));
        let contract = Contract::new();

        let snapshot = expect_success(contract.get_scoring_snapshot(accounts(1)));
        assert_eq!(snapshot.total_points, 0);
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.next_level_percentage, 0);
        assert_eq!(snapshot.badge, BadgeRank::Bronze3);

        let settings = expect_success(contract.get_settings(accounts(1)));
        assert_eq!(settings, ScoringSettings::default());
    }

    #[test]
    fn habit_completions_feed_the_snapshot() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();

        let habit_id = expect_success(contract.add_habit(
            "Stretch".to_string(),
            HabitFrequency::Daily,
            "#3b82f6".to_string(),
        ));

        // The creation entry for today starts incomplete; toggling it marks
        // today completed.
        expect_success(contract.toggle_habit_completion(habit_id.clone(), today_string()));
        expect_success(contract.toggle_habit_completion(
            habit_id.clone(),
            models::date::format_date(TODAY - 1),
        ));

        let snapshot = expect_success(contract.get_scoring_snapshot(accounts(1)));
        assert_eq!(snapshot.total_points, 20);

        let streak = expect_success(contract.get_habit_streak(habit_id.clone()));
        assert_eq!(streak, 2);

        let stats = expect_success(contract.get_habit_stats(habit_id));
        assert_eq!(stats.completed_days, 2);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn task_lifecycle_earns_and_forfeits_points() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();

        let custom = expect_success(contract.add_task(
            "Write report".to_string(),
            today_string(),
            None,
            Some(25),
            Some(Priority::High),
            None,
        ));
        set_context(accounts(1), at_tick(1));
        let plain = expect_success(contract.add_task(
            "Water plants".to_string(),
            today_string(),
            None,
            None,
            None,
            None,
        ));

        expect_success(contract.toggle_task_completion(custom));
        expect_success(contract.toggle_task_completion(plain.clone()));

        // 25 custom + 5 default.
        let total = expect_success(contract.get_total_points(accounts(1)));
        assert_eq!(total, 30);

        // Failing the plain task retracts its 5 points and costs 2 more.
        expect_success(contract.toggle_task_failed(plain));
        let total = expect_success(contract.get_total_points(accounts(1)));
        assert_eq!(total, 23);
    }

    #[test]
    fn failure_penalty_clamps_the_total_at_zero() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();

        let task_id = expect_success(contract.add_task(
            "Doomed".to_string(),
            today_string(),
            None,
            None,
            None,
            None,
        ));
        expect_success(contract.toggle_task_failed(task_id));

        let snapshot = expect_success(contract.get_scoring_snapshot(accounts(1)));
        assert_eq!(snapshot.total_points, 0);
        assert_eq!(snapshot.badge, BadgeRank::Bronze3);
    }

    #[test]
    fn remembered_task_lands_in_unique_records() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();

        let task_id = expect_success(contract.add_task(
            "First marathon".to_string(),
            today_string(),
            Some(true),
            None,
            None,
            None,
        ));
        expect_success(contract.toggle_task_completion(task_id));

        let records = expect_success(contract.get_unique_records(accounts(1)));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "First marathon");
        assert!(records[0].completed);
    }

    #[test]
    fn project_completion_archives_a_snapshot_and_pays_the_bonus() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();

        let project_id = expect_success(contract.add_project(
            "Garden".to_string(),
            "Back yard overhaul".to_string(),
            None,
            None,
            None,
        ));
        set_context(accounts(1), at_tick(1));
        let first = expect_success(contract.add_project_stage(
            project_id.clone(), "Plan".to_string(), Some(20), None,
        ));
        set_context(accounts(1), at_tick(2));
        let second = expect_success(contract.add_project_stage(
            project_id.clone(), "Plant".to_string(), Some(30), None,
        ));

        expect_success(contract.toggle_project_stage(project_id.clone(), first, None));
        expect_success(contract.toggle_project_stage(project_id.clone(), second, None));
        expect_success(contract.complete_project(project_id.clone(), Some("done".to_string())));

        // Active side: 50 stage points + 10 bonus. Archive side: the same
        // snapshot. Both count.
        let snapshot = expect_success(contract.get_scoring_snapshot(accounts(1)));
        assert_eq!(snapshot.total_points, 120);
        assert_eq!(snapshot.level, 2);
        // 20 points into the 150-point band to level 3.
        assert_eq!(snapshot.next_level_percentage, 13);

        let archived = expect_success(contract.get_completed_projects(accounts(1)));
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].total_points, 60);
        assert_eq!(archived[0].total_stages, 2);

        // Completing again is a state error.
        let repeat = contract.complete_project(project_id, None);
        assert!(matches!(repeat, Response::Error(ContractError::StateError(..))));
    }

    #[test]
    fn subtask_completion_rolls_up_into_the_snapshot() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();

        let project_id = expect_success(contract.add_project(
            "Move".to_string(), String::new(), None, None, None,
        ));
        set_context(accounts(1), at_tick(1));
        let todo_id = expect_success(contract.add_project_todo(
            project_id.clone(), "Pack".to_string(),
        ));
        set_context(accounts(1), at_tick(2));
        let subtask_id = expect_success(contract.add_project_todo_subtask(
            project_id.clone(), todo_id.clone(), "Books".to_string(),
        ));
        expect_success(contract.toggle_project_todo_subtask(
            project_id.clone(), todo_id.clone(), subtask_id,
        ));

        let projects = expect_success(contract.get_projects_by_owner(accounts(1)));
        assert!(projects[0].todos[0].completed);

        // Completing the project counts the finished todo in the snapshot.
        expect_success(contract.complete_project(project_id, None));
        let archived = expect_success(contract.get_completed_projects(accounts(1)));
        assert_eq!(archived[0].total_points, 5);
    }

    #[test]
    fn settings_updates_reshape_the_ladder() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();

        let invalid = contract.update_settings(None, None, None, Some(vec![]));
        assert!(matches!(invalid, Response::Error(ContractError::ValidationError(..))));

        expect_success(contract.update_settings(Some(50), None, None, Some(vec![40, 80])));

        let habit_id = expect_success(contract.add_habit(
            "Meditate".to_string(),
            HabitFrequency::Daily,
            "#8b5cf6".to_string(),
        ));
        expect_success(contract.toggle_habit_completion(habit_id, today_string()));

        let snapshot = expect_success(contract.get_scoring_snapshot(accounts(1)));
        assert_eq!(snapshot.total_points, 50);
        // 50 points on the [40, 80] ladder: level 2, a quarter into the band.
        assert_eq!(snapshot.level, 2);
        assert_eq!(snapshot.next_level_percentage, 25);
    }

    #[test]
    fn other_accounts_cannot_touch_owned_entities() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();
        let habit_id = expect_success(contract.add_habit(
            "Journal".to_string(),
            HabitFrequency::Daily,
            "#ef4444".to_string(),
        ));

        set_context(accounts(2), at_tick(1));
        let denied = contract.toggle_habit_completion(habit_id.clone(), today_string());
        assert!(matches!(denied, Response::Error(ContractError::AccessError(_))));

        let denied = contract.delete_habit(habit_id);
        assert!(matches!(denied, Response::Error(ContractError::AccessError(_))));
    }

    #[test]
    fn deleting_a_project_takes_its_notes_along() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();

        let project_id = expect_success(contract.add_project(
            "Thesis".to_string(), String::new(), None, None, None,
        ));
        set_context(accounts(1), at_tick(1));
        expect_success(contract.add_note(
            "Outline".to_string(),
            "Chapters 1-3".to_string(),
            NoteCategory::Project,
            Some(project_id.clone()),
            None,
        ));
        set_context(accounts(1), at_tick(2));
        expect_success(contract.add_note(
            "Groceries".to_string(),
            String::new(),
            NoteCategory::General,
            None,
            None,
        ));

        expect_success(contract.delete_project(project_id));

        let notes = expect_success(contract.get_notes_by_owner(accounts(1)));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Groceries");
    }

    #[test]
    fn empty_collections_answer_not_found_on_list_getters() {
        set_context(accounts(1), at_tick(0));
        let contract = Contract::new();

        assert!(matches!(
            contract.get_habits_by_owner(accounts(1)),
            Response::Error(ContractError::NotFound(..))
        ));
        assert!(matches!(
            contract.get_tasks_by_owner(accounts(1)),
            Response::Error(ContractError::NotFound(..))
        ));
        assert!(matches!(
            contract.get_projects_by_owner(accounts(1)),
            Response::Error(ContractError::NotFound(..))
        ));
    }

    #[test]
    fn project_statistics_cover_both_lists() {
        set_context(accounts(1), at_tick(0));
        let mut contract = Contract::new();

        let finished = expect_success(contract.add_project(
            "Done deal".to_string(), String::new(), None, None, None,
        ));
        set_context(accounts(1), at_tick(1));
        let stage = expect_success(contract.add_project_stage(
            finished.clone(), "Only stage".to_string(), Some(40), None,
        ));
        expect_success(contract.toggle_project_stage(finished.clone(), stage, None));
        expect_success(contract.complete_project(finished, None));

        set_context(accounts(1), at_tick(2));
        expect_success(contract.add_project(
            "Fresh start".to_string(), String::new(), None, None, None,
        ));

        let stats = expect_success(contract.get_project_statistics(accounts(1)));
        assert_eq!(stats.total_projects, 3);
        assert_eq!(stats.ongoing_projects, 2);
        assert_eq!(stats.completed_projects, 1);
        // Completed source project stores 48 (40 + 8 bonus); the archive
        // mirrors it; the fresh project adds nothing.
        assert_eq!(stats.total_points, 96);
        // Progress 100 and 0.
        assert_eq!(stats.average_completion, 50);
    }
}
