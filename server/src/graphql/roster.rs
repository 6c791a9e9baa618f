use async_graphql::{Context, Enum, ErrorExtensions, InputObject, Object, SimpleObject};
use platform_api::{ApiError, internal_error};
use products_hr::{
    CategoryFilter, DEPARTMENTS, DeleteOutcome, EditForm, Employee, EmployeeDraft, FormKind,
    Notification, NotificationLevel, RosterError, RosterStats, SKILLS,
};
use tracing::instrument;

use super::SharedRoster;

#[derive(Clone, Debug, SimpleObject)]
pub struct EmployeeNode {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: String,
    pub skills: Vec<String>,
    pub certified: bool,
}

impl From<Employee> for EmployeeNode {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            department: employee.department,
            skills: employee.skills,
            certified: employee.certified,
        }
    }
}

fn nodes(employees: Vec<Employee>) -> Vec<EmployeeNode> {
    employees.into_iter().map(EmployeeNode::from).collect()
}

#[derive(Clone, Debug, SimpleObject)]
pub struct StatsPayload {
    pub total: u64,
    pub certified: u64,
    pub non_certified: u64,
    /// `"N/A"` when no employee lists a skill.
    pub most_common_skill: String,
}

impl From<RosterStats> for StatsPayload {
    fn from(stats: RosterStats) -> Self {
        Self {
            total: stats.total as u64,
            certified: stats.certified as u64,
            non_certified: stats.non_certified as u64,
            most_common_skill: stats.most_common_skill_label().to_string(),
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum FilterKind {
    All,
    Certified,
    Department,
}

#[derive(Clone, Debug, InputObject)]
pub struct FilterInput {
    pub kind: FilterKind,
    /// Required when `kind` is `DEPARTMENT`.
    pub name: Option<String>,
}

impl TryFrom<FilterInput> for CategoryFilter {
    type Error = ApiError;

    fn try_from(input: FilterInput) -> Result<Self, Self::Error> {
        match (input.kind, input.name) {
            (FilterKind::All, _) => Ok(CategoryFilter::All),
            (FilterKind::Certified, _) => Ok(CategoryFilter::Certified),
            (FilterKind::Department, Some(name)) if !name.is_empty() => {
                Ok(CategoryFilter::department(name))
            }
            (FilterKind::Department, _) => Err(ApiError::InvalidInput(
                "department filter needs a name".into(),
            )),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct FilterPayload {
    pub kind: FilterKind,
    pub name: Option<String>,
    pub label: String,
}

impl From<&CategoryFilter> for FilterPayload {
    fn from(filter: &CategoryFilter) -> Self {
        let (kind, name) = match filter {
            CategoryFilter::All => (FilterKind::All, None),
            CategoryFilter::Certified => (FilterKind::Certified, None),
            CategoryFilter::Department { name } => (FilterKind::Department, Some(name.clone())),
        };
        Self {
            kind,
            name,
            label: filter.to_string(),
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct EmployeeInput {
    pub name: String,
    pub email: String,
    pub department: String,
    #[graphql(default)]
    pub skills: Vec<String>,
    #[graphql(default)]
    pub certified: bool,
}

impl From<EmployeeInput> for EmployeeDraft {
    fn from(input: EmployeeInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            department: input.department,
            skills: input.skills,
            certified: input.certified,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct SkillOption {
    pub skill: String,
    pub checked: bool,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct EditingPayload {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: String,
    pub certified: bool,
    pub skills: Vec<SkillOption>,
}

impl From<&EditForm> for EditingPayload {
    fn from(form: &EditForm) -> Self {
        Self {
            id: form.id,
            name: form.draft.name.clone(),
            email: form.draft.email.clone(),
            department: form.draft.department.clone(),
            certified: form.draft.certified,
            skills: form
                .skill_options()
                .into_iter()
                .map(|(skill, checked)| SkillOption {
                    skill: skill.to_string(),
                    checked,
                })
                .collect(),
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "FormKind")]
pub enum FormKindGql {
    Create,
    Edit,
}

impl From<FormKindGql> for FormKind {
    fn from(kind: FormKindGql) -> Self {
        match kind {
            FormKindGql::Create => FormKind::Create,
            FormKindGql::Edit => FormKind::Edit,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct FieldErrorPayload {
    pub field: String,
    pub message: String,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "NotificationLevel")]
pub enum NotificationLevelGql {
    Success,
    Error,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct NotificationPayload {
    pub message: String,
    pub level: NotificationLevelGql,
}

impl From<Notification> for NotificationPayload {
    fn from(notification: Notification) -> Self {
        let level = match notification.level {
            NotificationLevel::Success => NotificationLevelGql::Success,
            NotificationLevel::Error => NotificationLevelGql::Error,
        };
        Self {
            message: notification.message,
            level,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeleteOutcomeKind {
    Deleted,
    Declined,
    NotFound,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DeletePayload {
    pub outcome: DeleteOutcomeKind,
    pub employee: Option<EmployeeNode>,
}

impl From<DeleteOutcome> for DeletePayload {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted(employee) => Self {
                outcome: DeleteOutcomeKind::Deleted,
                employee: Some(employee.into()),
            },
            DeleteOutcome::Declined => Self {
                outcome: DeleteOutcomeKind::Declined,
                employee: None,
            },
            DeleteOutcome::NotFound => Self {
                outcome: DeleteOutcomeKind::NotFound,
                employee: None,
            },
        }
    }
}

fn roster<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a SharedRoster> {
    ctx.data::<SharedRoster>()
}

fn roster_error(err: RosterError) -> async_graphql::Error {
    match err {
        RosterError::Validation(errors) => ApiError::validation(
            errors
                .iter()
                .map(|(field, err)| (field.to_string(), err.to_string())),
        )
        .extend(),
        RosterError::NotEditing => {
            ApiError::InvalidInput("no employee is open for editing".into()).extend()
        }
        RosterError::Store(inner) => internal_error(inner),
    }
}

#[derive(Default)]
pub struct RosterQuery;

#[Object]
impl RosterQuery {
    /// The current view: category filter, then search.
    async fn employees(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<EmployeeNode>> {
        let roster = roster(ctx)?.lock().await;
        Ok(nodes(roster.view()))
    }

    /// Every record, in list order, ignoring filter and search.
    async fn all_employees(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<EmployeeNode>> {
        let roster = roster(ctx)?.lock().await;
        Ok(nodes(roster.employees().to_vec()))
    }

    async fn stats(&self, ctx: &Context<'_>) -> async_graphql::Result<StatsPayload> {
        let roster = roster(ctx)?.lock().await;
        Ok(roster.stats().into())
    }

    async fn filter(&self, ctx: &Context<'_>) -> async_graphql::Result<FilterPayload> {
        let roster = roster(ctx)?.lock().await;
        Ok(roster.filter().into())
    }

    async fn search(&self, ctx: &Context<'_>) -> async_graphql::Result<String> {
        let roster = roster(ctx)?.lock().await;
        Ok(roster.search().to_string())
    }

    async fn editing(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<EditingPayload>> {
        let roster = roster(ctx)?.lock().await;
        Ok(roster.editing().map(EditingPayload::from))
    }

    async fn field_errors(
        &self,
        ctx: &Context<'_>,
        form: FormKindGql,
    ) -> async_graphql::Result<Vec<FieldErrorPayload>> {
        let roster = roster(ctx)?.lock().await;
        Ok(roster
            .field_errors()
            .for_form(form.into())
            .into_iter()
            .map(|(field, err)| FieldErrorPayload {
                field: field.to_string(),
                message: err.to_string(),
            })
            .collect())
    }

    async fn notification(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Option<NotificationPayload>> {
        let roster = roster(ctx)?.lock().await;
        Ok(roster.notification().map(NotificationPayload::from))
    }

    async fn departments(&self) -> Vec<String> {
        DEPARTMENTS.iter().map(|d| d.to_string()).collect()
    }

    async fn skills(&self) -> Vec<String> {
        SKILLS.iter().map(|s| s.to_string()).collect()
    }

    /// CSV report over the full list.
    async fn export_csv(&self, ctx: &Context<'_>) -> async_graphql::Result<String> {
        let roster = roster(ctx)?.lock().await;
        Ok(roster.export_csv())
    }
}

#[derive(Default)]
pub struct RosterMutation;

#[Object]
impl RosterMutation {
    #[instrument(name = "graphql.roster.add", skip_all)]
    async fn add_employee(
        &self,
        ctx: &Context<'_>,
        input: EmployeeInput,
    ) -> async_graphql::Result<EmployeeNode> {
        let mut roster = roster(ctx)?.lock().await;
        let employee = roster
            .add(&input.into())
            .await
            .map_err(roster_error)?;
        Ok(employee.into())
    }

    #[instrument(name = "graphql.roster.delete", skip(self, ctx))]
    async fn delete_employee(
        &self,
        ctx: &Context<'_>,
        id: i64,
        confirm: bool,
    ) -> async_graphql::Result<DeletePayload> {
        let mut roster = roster(ctx)?.lock().await;
        let outcome = roster.delete(id, &confirm).await.map_err(roster_error)?;
        Ok(outcome.into())
    }

    /// `NOT_FOUND` when no employee has this id; the edit session is untouched.
    async fn open_edit(
        &self,
        ctx: &Context<'_>,
        id: i64,
    ) -> async_graphql::Result<EditingPayload> {
        let mut roster = roster(ctx)?.lock().await;
        roster
            .open_edit(id)
            .map(EditingPayload::from)
            .ok_or_else(|| ApiError::NotFound.extend())
    }

    #[instrument(name = "graphql.roster.submit_edit", skip_all)]
    async fn submit_edit(
        &self,
        ctx: &Context<'_>,
        input: EmployeeInput,
    ) -> async_graphql::Result<Option<EmployeeNode>> {
        let mut roster = roster(ctx)?.lock().await;
        let updated = roster
            .submit_edit(&input.into())
            .await
            .map_err(roster_error)?;
        Ok(updated.map(EmployeeNode::from))
    }

    async fn cancel_edit(&self, ctx: &Context<'_>) -> async_graphql::Result<bool> {
        let mut roster = roster(ctx)?.lock().await;
        roster.cancel_edit();
        Ok(true)
    }

    async fn set_filter(
        &self,
        ctx: &Context<'_>,
        filter: FilterInput,
    ) -> async_graphql::Result<Vec<EmployeeNode>> {
        let filter = CategoryFilter::try_from(filter).map_err(|err| err.extend())?;
        let mut roster = roster(ctx)?.lock().await;
        Ok(nodes(roster.set_filter(filter)))
    }

    async fn set_search(
        &self,
        ctx: &Context<'_>,
        term: String,
    ) -> async_graphql::Result<Vec<EmployeeNode>> {
        let mut roster = roster(ctx)?.lock().await;
        Ok(nodes(roster.set_search(term)))
    }

    /// Loss-of-focus check; returns the error message, or `null` when valid.
    async fn validate_field(
        &self,
        ctx: &Context<'_>,
        form: FormKindGql,
        field: String,
        value: String,
    ) -> async_graphql::Result<Option<String>> {
        let mut roster = roster(ctx)?.lock().await;
        Ok(roster
            .blur(form.into(), &field, &value)
            .map(|err| err.to_string()))
    }
}
