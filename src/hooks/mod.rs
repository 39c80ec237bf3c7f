use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Lifecycle points of the host deployment tool that the baker attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    BeforePackage,
    AfterPackage,
    BeforeFunctionPackage,
    AfterFunctionPackage,
    BeforeInvokeLocal,
    AfterInvokeLocal,
    BeforeOfflineStart,
    AfterOfflineStart,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 8] = [
        LifecycleHook::BeforePackage,
        LifecycleHook::AfterPackage,
        LifecycleHook::BeforeFunctionPackage,
        LifecycleHook::AfterFunctionPackage,
        LifecycleHook::BeforeInvokeLocal,
        LifecycleHook::AfterInvokeLocal,
        LifecycleHook::BeforeOfflineStart,
        LifecycleHook::AfterOfflineStart,
    ];

    /// Event name as emitted by the host tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleHook::BeforePackage => "before:package:createDeploymentArtifacts",
            LifecycleHook::AfterPackage => "after:package:createDeploymentArtifacts",
            LifecycleHook::BeforeFunctionPackage => "before:deploy:function:packageFunction",
            LifecycleHook::AfterFunctionPackage => "after:deploy:function:packageFunction",
            LifecycleHook::BeforeInvokeLocal => "before:invoke:local:invoke",
            LifecycleHook::AfterInvokeLocal => "after:invoke:local:invoke",
            LifecycleHook::BeforeOfflineStart => "before:offline:start:init",
            LifecycleHook::AfterOfflineStart => "before:offline:start:end",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleHook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleHook::ALL
            .into_iter()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| format!("unknown lifecycle hook '{s}'"))
    }
}

/// What the baker does at a hook point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    /// Resolve secrets and write the manifest.
    Package,
    /// Remove the manifest.
    Cleanup,
}

/// Registry mapping lifecycle hooks to baker actions.
#[derive(Debug, Default, Clone)]
pub struct HookRegistry {
    handlers: HashMap<LifecycleHook, Vec<HookAction>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register an action for a hook.
    pub fn on(&mut self, hook: LifecycleHook, action: HookAction) {
        self.handlers.entry(hook).or_default().push(action);
    }

    /// Actions registered for a hook, in registration order.
    pub fn actions(&self, hook: LifecycleHook) -> &[HookAction] {
        self.handlers.get(&hook).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Hooks with at least one action, in lifecycle order.
    pub fn hooks(&self) -> Vec<LifecycleHook> {
        LifecycleHook::ALL
            .into_iter()
            .filter(|hook| self.handlers.contains_key(hook))
            .collect()
    }

    /// Write-before / delete-after around every packaging step.
    pub fn packaging_defaults() -> Self {
        let mut registry = Self::new();
        for hook in LifecycleHook::ALL {
            let action = match hook {
                LifecycleHook::BeforePackage
                | LifecycleHook::BeforeFunctionPackage
                | LifecycleHook::BeforeInvokeLocal
                | LifecycleHook::BeforeOfflineStart => HookAction::Package,
                LifecycleHook::AfterPackage
                | LifecycleHook::AfterFunctionPackage
                | LifecycleHook::AfterInvokeLocal
                | LifecycleHook::AfterOfflineStart => HookAction::Cleanup,
            };
            registry.on(hook, action);
        }
        registry
    }
}
