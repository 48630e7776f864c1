//! Scripted in-memory cloud provider shared by the engine's unit tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lightsout_core::{
    ActionRequest, CredentialScope, ResourceRef, RunError, SCHEDULE_TAG_KEY, TagSet,
};
use lightsout_provider::{
    CloudProvider, DiscoveredResource, DynCloudProvider, GroupDetail, ProviderError, ScopeResolver,
};

/// Lifecycle states the fake tracks per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeState {
    Running,
    Stopped,
}

/// In-memory provider with scriptable failures and a call log.
pub struct FakeCloud {
    scope: CredentialScope,
    instances: Vec<DiscoveredResource>,
    groups: Vec<DiscoveredResource>,
    states: Mutex<HashMap<String, FakeState>>,
    group_details: Mutex<HashMap<String, GroupDetail>>,
    /// Remaining transient failures per instance id.
    transient: Mutex<HashMap<String, u32>>,
    /// Instance ids whose start/stop always fails permanently.
    permanent_failures: BTreeSet<String>,
    /// Remaining transient failures for list calls.
    list_failures: Mutex<u32>,
    /// When set, every group mutation fails with a service error.
    fail_group_calls: bool,
    /// Ordered log of provider calls.
    calls: Mutex<Vec<String>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            scope: CredentialScope::local(),
            instances: Vec::new(),
            groups: Vec::new(),
            states: Mutex::new(HashMap::new()),
            group_details: Mutex::new(HashMap::new()),
            transient: Mutex::new(HashMap::new()),
            permanent_failures: BTreeSet::new(),
            list_failures: Mutex::new(0),
            fail_group_calls: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_instance(
        mut self,
        id: &str,
        schedule: Option<&str>,
        group: Option<&str>,
        state: FakeState,
    ) -> Self {
        let mut tags = TagSet::new();
        if let Some(value) = schedule {
            tags.insert(SCHEDULE_TAG_KEY, value);
        }
        if let Some(group) = group {
            tags.insert("aws:autoscaling:groupName", group);
        }
        self.instances.push(DiscoveredResource {
            resource: ResourceRef::instance(id, "us-east-1", "local"),
            tags,
            group_name: group.map(ToOwned::to_owned),
        });
        self.states.lock().unwrap().insert(id.to_owned(), state);
        self
    }

    pub fn with_group(mut self, name: &str, schedule: Option<&str>, suspended: &[&str]) -> Self {
        let mut tags = TagSet::new();
        if let Some(value) = schedule {
            tags.insert(SCHEDULE_TAG_KEY, value);
        }
        if schedule.is_some() {
            self.groups.push(DiscoveredResource {
                resource: ResourceRef::group(name, "us-east-1", "local"),
                tags: tags.clone(),
                group_name: None,
            });
        }
        self.group_details.lock().unwrap().insert(
            name.to_owned(),
            GroupDetail {
                name: name.to_owned(),
                suspended_processes: suspended.iter().map(|s| (*s).to_owned()).collect(),
                tags,
            },
        );
        self
    }

    pub fn with_transient_failures(self, id: &str, count: u32) -> Self {
        self.transient.lock().unwrap().insert(id.to_owned(), count);
        self
    }

    pub fn with_permanent_failure(mut self, id: &str) -> Self {
        self.permanent_failures.insert(id.to_owned());
        self
    }

    pub fn with_list_failures(self, count: u32) -> Self {
        *self.list_failures.lock().unwrap() = count;
        self
    }

    pub fn with_failing_group_calls(mut self) -> Self {
        self.fail_group_calls = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn state_of(&self, id: &str) -> Option<FakeState> {
        self.states.lock().unwrap().get(id).copied()
    }

    pub fn group_detail(&self, name: &str) -> Option<GroupDetail> {
        self.group_details.lock().unwrap().get(name).cloned()
    }

    fn log(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }

    fn take_transient(&self, id: &str) -> bool {
        let mut transient = self.transient.lock().unwrap();
        match transient.get_mut(id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn guard_group_call(&self, what: &str, group: &str) -> Result<(), ProviderError> {
        self.log(format!("{what} {group}"));
        if self.fail_group_calls {
            return Err(ProviderError::Service(format!("{what} {group} rejected")));
        }
        Ok(())
    }
}

impl CloudProvider for FakeCloud {
    fn name(&self) -> &str {
        "fake"
    }

    fn scope(&self) -> &CredentialScope {
        &self.scope
    }

    fn region(&self) -> &str {
        "us-east-1"
    }

    async fn list_tagged_instances(
        &self,
        tag_key: &str,
    ) -> Result<Vec<DiscoveredResource>, ProviderError> {
        let mut failures = self.list_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(ProviderError::Connection("transient list failure".into()));
        }
        drop(failures);
        Ok(self
            .instances
            .iter()
            .filter(|r| r.tags.contains_key(tag_key))
            .cloned()
            .collect())
    }

    async fn list_tagged_groups(
        &self,
        tag_key: &str,
    ) -> Result<Vec<DiscoveredResource>, ProviderError> {
        Ok(self
            .groups
            .iter()
            .filter(|r| r.tags.contains_key(tag_key))
            .cloned()
            .collect())
    }

    async fn start_instance(&self, id: &str) -> Result<(), ProviderError> {
        self.log(format!("start {id}"));
        if self.permanent_failures.contains(id) {
            return Err(ProviderError::Service(format!("{id} rejected")));
        }
        if self.take_transient(id) {
            return Err(ProviderError::Throttled);
        }
        let mut states = self.states.lock().unwrap();
        match states.get(id) {
            Some(FakeState::Running) => {
                Err(ProviderError::InvalidState(format!("{id} is already running")))
            }
            Some(FakeState::Stopped) => {
                states.insert(id.to_owned(), FakeState::Running);
                Ok(())
            }
            None => Err(ProviderError::NotFound(id.to_owned())),
        }
    }

    async fn stop_instance(&self, id: &str) -> Result<(), ProviderError> {
        self.log(format!("stop {id}"));
        if self.permanent_failures.contains(id) {
            return Err(ProviderError::Service(format!("{id} rejected")));
        }
        if self.take_transient(id) {
            return Err(ProviderError::Throttled);
        }
        let mut states = self.states.lock().unwrap();
        match states.get(id) {
            Some(FakeState::Stopped) => {
                Err(ProviderError::InvalidState(format!("{id} is already stopped")))
            }
            Some(FakeState::Running) => {
                states.insert(id.to_owned(), FakeState::Stopped);
                Ok(())
            }
            None => Err(ProviderError::NotFound(id.to_owned())),
        }
    }

    async fn describe_group(&self, name: &str) -> Result<GroupDetail, ProviderError> {
        self.group_details
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(name.to_owned()))
    }

    async fn suspend_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> Result<(), ProviderError> {
        self.guard_group_call("suspend", group)?;
        let mut details = self.group_details.lock().unwrap();
        if let Some(detail) = details.get_mut(group) {
            detail
                .suspended_processes
                .extend(processes.iter().cloned());
        }
        Ok(())
    }

    async fn resume_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> Result<(), ProviderError> {
        self.guard_group_call("resume", group)?;
        let mut details = self.group_details.lock().unwrap();
        if let Some(detail) = details.get_mut(group) {
            for process in processes {
                detail.suspended_processes.remove(process);
            }
        }
        Ok(())
    }

    async fn tag_group(&self, group: &str, key: &str, value: &str) -> Result<(), ProviderError> {
        self.guard_group_call("tag", group)?;
        let mut details = self.group_details.lock().unwrap();
        if let Some(detail) = details.get_mut(group) {
            detail.tags.insert(key, value);
        }
        Ok(())
    }

    async fn untag_group(&self, group: &str, key: &str) -> Result<(), ProviderError> {
        self.guard_group_call("untag", group)?;
        let mut details = self.group_details.lock().unwrap();
        if let Some(detail) = details.get_mut(group) {
            let remaining: TagSet = detail
                .tags
                .iter()
                .filter(|(k, _)| *k != key)
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            detail.tags = remaining;
        }
        Ok(())
    }
}

/// Resolver that hands out a pre-built fake provider.
pub struct FakeResolver {
    provider: Arc<FakeCloud>,
}

impl FakeResolver {
    pub fn new(provider: Arc<FakeCloud>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ScopeResolver for FakeResolver {
    async fn resolve(
        &self,
        _request: &ActionRequest,
    ) -> Result<Arc<dyn DynCloudProvider>, RunError> {
        Ok(self.provider.clone())
    }
}

/// Resolver that always rejects, for fatal-path tests.
pub struct RejectingResolver;

#[async_trait]
impl ScopeResolver for RejectingResolver {
    async fn resolve(
        &self,
        _request: &ActionRequest,
    ) -> Result<Arc<dyn DynCloudProvider>, RunError> {
        Err(RunError::Authorization(
            "trust policy does not name the caller".to_owned(),
        ))
    }
}
