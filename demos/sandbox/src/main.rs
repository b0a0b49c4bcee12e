// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


// Meridian Sandbox
// Walks through reflected classes, events and resource managers.

use anyhow::{Context, Result};
use meridian_core::{
    bind_slot, share, ClassBuilder, DynParams, ModuleRegistrar, ModuleRegistration,
    ReflectResult, ReflectionContext, Signature, Value, ValueType,
};
use meridian_data::{ManagerRegistry, Resource, ResourceManager, ResourceSettings};
use std::sync::PoisonError;

// --- Reflected classes ---

fn register_sandbox(module: &mut ModuleRegistrar<'_>) -> ReflectResult<()> {
    module.register_class(
        ClassBuilder::new("Counter")
            .description("Counts and reports every change")
            .attribute("Count", 0)
            .attribute("Step", 1)
            .event("Changed", Signature::void([ValueType::Int]))
            .method("Increment", Signature::new(ValueType::Int, []), |obj, params| {
                let count = obj.get_attribute("Count")?.as_int().unwrap_or(0);
                let step = obj.get_attribute("Step")?.as_int().unwrap_or(1);
                obj.set_attribute("Count", count + step)?;
                let mut changed = DynParams::with_args([Value::Int(count + step)]);
                obj.emit_event("Changed", &mut changed)?;
                params.set_return_value(count + step)?;
                Ok(())
            })
            .default_constructor()
            .constructor([ValueType::Int], |obj, args| {
                let step = args.parameter(0).cloned().unwrap_or(Value::Int(1));
                obj.set_attribute("Step", step)?;
                Ok(())
            })
            .build()?,
    )?;
    module.register_class(
        ClassBuilder::new("Display")
            .attribute("Text", "")
            .slot("Show", Signature::void([ValueType::Int]), |obj, params| {
                let value = params.parameter(0).cloned().unwrap_or(Value::Int(0));
                obj.set_attribute("Text", format!("count = {value}"))?;
                log::info!("Display shows '{value}'.");
                Ok(())
            })
            .build()?,
    )
}

meridian_core::inventory::submit! {
    ModuleRegistration {
        name: "Sandbox",
        vendor: "Meridian",
        license: "Apache-2.0",
        description: "Classes used by the sandbox",
        register: register_sandbox,
    }
}

fn run_reflection_demo() -> Result<()> {
    let registry = ReflectionContext::read();
    for event in registry.drain_events() {
        log::debug!("Registry event: {event:?}");
    }
    log::info!(
        "Registered classes: {}",
        registry.class_names().collect::<Vec<_>>().join(", ")
    );

    let step = DynParams::with_args([Value::Int(5)]);
    let mut counter = registry.create_instance("Counter", &step)?;
    let display = share(registry.create_default("Display")?);
    let show = bind_slot(&display, "Show")?;
    counter.connect_event("Changed", &show)?;

    for _ in 0..3 {
        counter.invoke("Increment", [])?;
    }
    counter.set_values("Step=2")?;
    let last = counter.call_method_str("Increment", "")?;
    log::info!("Last increment returned {last:?}.");
    log::info!("Counter state: {counter}");

    let snapshot = counter.snapshot()?;
    log::info!("Counter snapshot: {}", snapshot.to_json()?);

    let text = display
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_attribute("Text")?;
    log::info!("Display text is {text}.");
    Ok(())
}

// --- Resources ---

#[derive(Debug, Resource)]
struct Texture {
    path: String,
    texels: usize,
}

fn load_texture(name: &str) -> Result<Texture> {
    if name.is_empty() {
        anyhow::bail!("empty texture path");
    }
    Ok(Texture {
        path: format!("assets/textures/{name}.png"),
        texels: name.len() * 64,
    })
}

fn run_resource_demo(settings: &ResourceSettings) -> Result<()> {
    let mut managers = ManagerRegistry::new();
    managers.insert(ResourceManager::with_settings(load_texture, settings));

    let textures = managers
        .get_mut::<Texture>()
        .context("texture manager missing")?;
    let grass = textures.acquire("grass")?;
    textures.get_by_name("sky")?;
    if let Some(texture) = grass.get(textures) {
        log::info!("Loaded '{}' with {} texels.", texture.path, texture.texels);
    }

    let swept = managers.remove_unused_all();
    log::info!(
        "Sweep removed {swept} unused texture(s); grass still loaded: {}.",
        grass.is_valid()
    );
    for (type_name, count) in managers.summary() {
        log::info!("{type_name}: {count} resource(s)");
    }

    drop(managers);
    log::info!(
        "After dropping the managers the handler is valid: {}.",
        grass.is_valid()
    );
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = match std::env::args().nth(1) {
        Some(path) => ResourceSettings::from_file(&path)?,
        None => ResourceSettings {
            unload_unused: true,
            ..ResourceSettings::default()
        },
    };

    run_reflection_demo()?;
    run_resource_demo(&settings)?;
    ReflectionContext::shutdown();
    Ok(())
}
