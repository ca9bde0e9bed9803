//! console::sub_department_form
//!
//! Create and rename sub-departments. Creating one needs an owning
//! department, picked from the options loaded by
//! [`SubDepartmentForm::load_department_options`].

use tracing::info;

use super::errors::FormError;
use super::form::{patch_listing, submit_label, FormMode};
use crate::api::operations::{
    self, CreateSubDepartmentData, DepartmentOptionsData, SubDepartmentsData,
    UpdateSubDepartmentData,
};
use crate::api::{FetchPolicy, GraphQlClient, QueryKey};
use crate::core::types::{DepartmentRef, EntityId, EntityName, SubDepartment};

#[derive(Debug, Clone, PartialEq)]
pub struct SubDepartmentForm {
    mode: FormMode<SubDepartment>,
    name: String,
    department_id: Option<EntityId>,
    department_options: Vec<DepartmentRef>,
    error: Option<FormError>,
    submitting: bool,
}

impl SubDepartmentForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            name: String::new(),
            department_id: None,
            department_options: Vec::new(),
            error: None,
            submitting: false,
        }
    }

    pub fn update(existing: SubDepartment) -> Self {
        Self {
            name: existing.name.clone(),
            department_id: Some(existing.department.id),
            mode: FormMode::Update(existing),
            department_options: Vec::new(),
            error: None,
            submitting: false,
        }
    }

    pub fn mode(&self) -> &FormMode<SubDepartment> {
        &self.mode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn department_id(&self) -> Option<EntityId> {
        self.department_id
    }

    /// Pick the owning department. The owner of an existing sub-department
    /// cannot change.
    pub fn select_department(&mut self, id: EntityId) -> bool {
        if !self.mode.is_create() {
            return false;
        }
        self.department_id = Some(id);
        true
    }

    pub fn department_options(&self) -> &[DepartmentRef] {
        &self.department_options
    }

    /// Fill the department picker.
    pub async fn load_department_options(
        &mut self,
        client: &GraphQlClient,
    ) -> Result<&[DepartmentRef], FormError> {
        let data = client
            .query::<DepartmentOptionsData>(
                &operations::departments_for_select(),
                FetchPolicy::CacheFirst,
            )
            .await?
            .into_data()?;
        self.department_options = data.departments.items;
        Ok(&self.department_options)
    }

    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn submit_label(&self) -> &'static str {
        submit_label(&self.mode, self.submitting)
    }

    pub fn validate(&self) -> Result<(EntityName, Option<EntityId>), FormError> {
        let name = EntityName::new(&self.name)
            .map_err(|_| FormError::validation("Sub-department name is required"))?;
        if self.mode.is_create() && self.department_id.is_none() {
            return Err(FormError::validation("Please select a department"));
        }
        Ok((name, self.department_id))
    }

    /// Send the form, then patch the sub-department listing under `target`.
    pub async fn submit(
        &mut self,
        client: &GraphQlClient,
        target: &QueryKey,
    ) -> Result<SubDepartment, FormError> {
        let (name, department_id) = match self.validate() {
            Ok(valid) => valid,
            Err(err) => {
                self.error = Some(err.clone());
                return Err(err);
            }
        };

        self.submitting = true;
        self.error = None;
        let result = match (&self.mode, department_id) {
            (FormMode::Update(existing), _) => client
                .mutate::<UpdateSubDepartmentData>(&operations::update_sub_department(
                    existing.id,
                    &name,
                ))
                .await
                .and_then(|r| r.into_data())
                .map(|d| d.update_sub_department),
            (FormMode::Create, Some(department_id)) => client
                .mutate::<CreateSubDepartmentData>(&operations::create_sub_department(
                    department_id,
                    &name,
                ))
                .await
                .and_then(|r| r.into_data())
                .map(|d| d.create_sub_department),
            (FormMode::Create, None) => {
                self.submitting = false;
                let err = FormError::validation("Please select a department");
                self.error = Some(err.clone());
                return Err(err);
            }
        };
        self.submitting = false;

        let saved = match result {
            Ok(saved) => saved,
            Err(err) => {
                let err = FormError::Api(err);
                self.error = Some(err.clone());
                return Err(err);
            }
        };

        let patched = saved.clone();
        if self.mode.is_create() {
            info!(id = %saved.id, department = %saved.department.id, "sub-department created");
            patch_listing::<SubDepartmentsData, _>(client, target, move |data| {
                data.sub_departments.push(patched);
            });
        } else {
            info!(id = %saved.id, "sub-department updated");
            patch_listing::<SubDepartmentsData, _>(client, target, move |data| {
                for item in data.sub_departments.iter_mut() {
                    if item.id == patched.id {
                        *item = patched.clone();
                    }
                }
            });
            self.mode = FormMode::Update(saved.clone());
        }
        Ok(saved)
    }
}

impl Default for SubDepartmentForm {
    fn default() -> Self {
        Self::create()
    }
}
