//! console::department_form
//!
//! Create and rename departments.
//!
//! A create form carries the department name plus a list of sub-department
//! rows, starting with one blank row. Blank rows are dropped on submit. An
//! update form renames only: the rows show the current sub-departments and
//! cannot be edited.

use tracing::info;

use super::errors::FormError;
use super::form::{patch_listing, submit_label, FormMode};
use crate::api::operations::{
    self, CreateDepartmentData, DepartmentsData, UpdateDepartmentData,
};
use crate::api::{GraphQlClient, QueryKey};
use crate::core::types::{Department, EntityName};

/// Department create/update form.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentForm {
    mode: FormMode<Department>,
    name: String,
    sub_departments: Vec<String>,
    error: Option<FormError>,
    submitting: bool,
}

impl DepartmentForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            name: String::new(),
            sub_departments: vec![String::new()],
            error: None,
            submitting: false,
        }
    }

    /// Edit form pre-filled from `existing`.
    pub fn update(existing: Department) -> Self {
        Self {
            name: existing.name.clone(),
            sub_departments: existing
                .sub_departments
                .iter()
                .map(|s| s.name.clone())
                .collect(),
            mode: FormMode::Update(existing),
            error: None,
            submitting: false,
        }
    }

    pub fn mode(&self) -> &FormMode<Department> {
        &self.mode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn sub_departments(&self) -> &[String] {
        &self.sub_departments
    }

    /// Append a blank row. Create mode only.
    pub fn add_sub_department(&mut self) -> bool {
        if !self.mode.is_create() {
            return false;
        }
        self.sub_departments.push(String::new());
        true
    }

    pub fn set_sub_department(&mut self, index: usize, name: impl Into<String>) -> bool {
        if !self.mode.is_create() {
            return false;
        }
        match self.sub_departments.get_mut(index) {
            Some(row) => {
                *row = name.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_sub_department(&mut self, index: usize) -> bool {
        if !self.mode.is_create() || index >= self.sub_departments.len() {
            return false;
        }
        self.sub_departments.remove(index);
        true
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

    /// The validated name and the non-blank sub-department names.
    pub fn validate(&self) -> Result<(EntityName, Vec<EntityName>), FormError> {
        let name = EntityName::new(&self.name)
            .map_err(|_| FormError::validation("Department name is required"))?;
        let subs = if self.mode.is_create() {
            self.sub_departments
                .iter()
                .filter_map(|row| EntityName::new(row).ok())
                .collect()
        } else {
            Vec::new()
        };
        Ok((name, subs))
    }

    /// Send the form, then patch the listing under `target`.
    ///
    /// On failure the error is kept on the form along with every field.
    pub async fn submit(
        &mut self,
        client: &GraphQlClient,
        target: &QueryKey,
    ) -> Result<Department, FormError> {
        let (name, subs) = match self.validate() {
            Ok(valid) => valid,
            Err(err) => {
                self.error = Some(err.clone());
                return Err(err);
            }
        };

        self.submitting = true;
        self.error = None;
        let result = match &self.mode {
            FormMode::Create => client
                .mutate::<CreateDepartmentData>(&operations::create_department(&name, &subs))
                .await
                .and_then(|r| r.into_data())
                .map(|d| d.create_department),
            FormMode::Update(existing) => client
                .mutate::<UpdateDepartmentData>(&operations::update_department(existing.id, &name))
                .await
                .and_then(|r| r.into_data())
                .map(|d| d.update_department),
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
            info!(id = %saved.id, "department created");
            patch_listing::<DepartmentsData, _>(client, target, move |data| {
                data.departments.items.insert(0, patched);
                data.departments.total += 1;
            });
        } else {
            info!(id = %saved.id, "department updated");
            patch_listing::<DepartmentsData, _>(client, target, move |data| {
                for item in data.departments.items.iter_mut() {
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

impl Default for DepartmentForm {
    fn default() -> Self {
        Self::create()
    }
}
