//! Emits the fourteen top-level phases in the sequential order §4.E
//! specifies, inserting the master sub-plan, common-node sequence and
//! etcd sub-plan where each top-level phase calls for them.

use crate::executors::ServerPhaseData;
use crate::executors::{
    app::AppData, bootstrap::BootstrapData, early_runtime_dns::EarlyRuntimeDnsData,
    election_change::ElectionChangeData, endpoints::EndpointsData, init::InitData,
    migration_links::MigrationLinksData, runtime::RuntimeData,
};
use nimbus_core::model::{ElectionChange, Executor, PackageRef, Phase, PhaseId, Server, UpdateServer};
use nimbus_core::model::{Plan, PlanArena};
use nimbus_core::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub supports_taints: bool,
    pub etcd_needs_update: bool,
    pub coredns_needs_update: bool,
    pub dns_needs_update: bool,
    pub role_migration_needed: bool,
    pub link_migration_needed: bool,
}

#[derive(Debug, Clone)]
pub struct BuildPlanInput {
    pub operation_id: String,
    pub cluster_name: String,
    pub installed_app: String,
    pub update_app: String,
    pub inventory: Vec<Server>,
    pub lead_master: Server,
    pub flags: FeatureFlags,
    pub num_parallel: usize,
    pub parallel_workers: usize,
    pub bootstrap_packages: Vec<PackageRef>,
    pub updates: Vec<UpdateServer>,
    pub runtime_packages: Vec<PackageRef>,
    pub app_package: PackageRef,
    pub dns_package: Option<PackageRef>,
    pub trusted_clusters: Vec<String>,
    pub endpoints_timeout_secs: u64,
}

fn push_leaf(
    arena: &mut PlanArena,
    id: PhaseId,
    executor: Executor,
    data: serde_json::Value,
) -> Result<usize> {
    arena.insert(Phase::leaf(id, executor, data))
}

fn push_group(
    arena: &mut PlanArena,
    id: PhaseId,
    children: Vec<usize>,
    limit_parallel: Option<usize>,
) -> Result<usize> {
    arena.insert(Phase {
        id,
        executor: Executor::Group,
        data: serde_json::Value::Null,
        children,
        depends_on: vec![],
        limit_parallel,
    })
}

fn update_for<'a>(updates: &'a [UpdateServer], server: &Server) -> Result<&'a UpdateServer> {
    updates
        .iter()
        .find(|u| u.server.instance_id == server.instance_id)
        .ok_or_else(|| {
            CoreError::PermanentOperational(format!(
                "no UpdateServer entry for {}",
                server.hostname
            ))
        })
}

/// `drain → system-upgrade → health → [taint] → uncordon → [endpoints] → [untaint]`,
/// strictly sequential (§4.E "Common-node sequence").
fn common_node_sequence(
    arena: &mut PlanArena,
    base: &PhaseId,
    update: &UpdateServer,
    waits_for_endpoints: bool,
    supports_taints: bool,
    endpoints_timeout_secs: u64,
) -> Result<usize> {
    let server = &update.server;
    let mut children = Vec::new();

    children.push(push_leaf(
        arena,
        base.child("drain"),
        Executor::Drain,
        ServerPhaseData::new(server.clone()),
    )?);

    children.push(push_leaf(
        arena,
        base.child("system-upgrade"),
        Executor::SystemUpgrade,
        serde_json::to_value(update).map_err(CoreError::Serde)?,
    )?);

    children.push(push_leaf(
        arena,
        base.child("health"),
        Executor::Health,
        ServerPhaseData::new(server.clone()),
    )?);

    if supports_taints {
        children.push(push_leaf(
            arena,
            base.child("taint"),
            Executor::Taint,
            ServerPhaseData::new(server.clone()),
        )?);
    }

    children.push(push_leaf(
        arena,
        base.child("uncordon"),
        Executor::Uncordon,
        ServerPhaseData::new(server.clone()),
    )?);

    if waits_for_endpoints {
        children.push(push_leaf(
            arena,
            base.child("endpoints"),
            Executor::Endpoints,
            serde_json::to_value(EndpointsData {
                timeout_secs: endpoints_timeout_secs,
            })
            .map_err(CoreError::Serde)?,
        )?);
    }

    if supports_taints {
        children.push(push_leaf(
            arena,
            base.child("untaint"),
            Executor::Untaint,
            ServerPhaseData::new(server.clone()),
        )?);
    }

    push_group(arena, base.clone(), children, None)
}

fn build_masters(
    arena: &mut PlanArena,
    root: &PhaseId,
    input: &BuildPlanInput,
) -> Result<usize> {
    let masters: Vec<&Server> = input
        .inventory
        .iter()
        .filter(|s| s.role.is_master())
        .collect();
    let others: Vec<Server> = masters
        .iter()
        .filter(|s| s.instance_id != input.lead_master.instance_id)
        .map(|s| (*s).clone())
        .collect();
    let known: Vec<Server> = masters.iter().map(|s| (*s).clone()).collect();

    let base = root.child("masters");
    let lead_update = update_for(&input.updates, &input.lead_master)?.clone();

    let lead_id = base.child("lead");
    let lead_idx = if !others.is_empty() {
        let mut lead_children = Vec::new();
        lead_children.push(push_leaf(
            arena,
            lead_id.child("kubelet-permissions"),
            Executor::KubeletPermissions,
            ServerPhaseData::new(input.lead_master.clone()),
        )?);
        lead_children.push(push_leaf(
            arena,
            lead_id.child("stepdown"),
            Executor::ElectionChange,
            serde_json::to_value(ElectionChangeData {
                change: ElectionChange::stepdown(&input.lead_master),
                known: known.clone(),
            })
            .map_err(CoreError::Serde)?,
        )?);
        lead_children.push(common_node_sequence(
            arena,
            &lead_id.child("sequence"),
            &lead_update,
            false,
            input.flags.supports_taints,
            input.endpoints_timeout_secs,
        )?);
        lead_children.push(push_leaf(
            arena,
            lead_id.child("elect"),
            Executor::ElectionChange,
            serde_json::to_value(ElectionChangeData {
                change: ElectionChange::elect(&input.lead_master, &others),
                known: known.clone(),
            })
            .map_err(CoreError::Serde)?,
        )?);
        push_group(arena, lead_id, lead_children, None)?
    } else {
        common_node_sequence(
            arena,
            &lead_id,
            &lead_update,
            false,
            input.flags.supports_taints,
            input.endpoints_timeout_secs,
        )?
    };

    let mut top_children = vec![lead_idx];

    for server in &others {
        let update = update_for(&input.updates, server)?.clone();
        let member_id = base.child(&server.hostname);
        let seq_idx = common_node_sequence(
            arena,
            &member_id.child("sequence"),
            &update,
            true,
            input.flags.supports_taints,
            input.endpoints_timeout_secs,
        )?;
        let enable_idx = push_leaf(
            arena,
            member_id.child("enable"),
            Executor::ElectionChange,
            serde_json::to_value(ElectionChangeData {
                change: ElectionChange::enable_one(server),
                known: known.clone(),
            })
            .map_err(CoreError::Serde)?,
        )?;
        let member_idx = push_group(arena, member_id, vec![seq_idx, enable_idx], None)?;
        top_children.push(member_idx);
    }

    // Strictly sequential, leader first (§4.E step 9).
    push_group(arena, base, top_children, None)
}

fn build_nodes(arena: &mut PlanArena, root: &PhaseId, input: &BuildPlanInput) -> Result<usize> {
    let base = root.child("nodes");
    let mut children = Vec::new();
    for server in input.inventory.iter().filter(|s| !s.role.is_master()) {
        let update = update_for(&input.updates, server)?.clone();
        let seq_idx = common_node_sequence(
            arena,
            &base.child(&server.hostname),
            &update,
            false,
            input.flags.supports_taints,
            input.endpoints_timeout_secs,
        )?;
        children.push(seq_idx);
    }
    push_group(arena, base, children, Some(input.parallel_workers))
}

fn build_etcd_subplan(
    arena: &mut PlanArena,
    root: &PhaseId,
    input: &BuildPlanInput,
) -> Result<usize> {
    let base = root.child("etcd");
    let masters: Vec<Server> = input
        .inventory
        .iter()
        .filter(|s| s.role.is_master())
        .cloned()
        .collect();

    let backup_base = base.child("backup");
    let mut backup_children = Vec::new();
    for server in &masters {
        backup_children.push(push_leaf(
            arena,
            backup_base.child(&server.hostname),
            Executor::EtcdBackup,
            ServerPhaseData::new(server.clone()),
        )?);
    }
    let backup_idx = push_group(arena, backup_base, backup_children, Some(input.num_parallel))?;

    let shutdown_base = base.child("shutdown");
    let mut shutdown_children = Vec::new();
    for server in &masters {
        shutdown_children.push(push_leaf(
            arena,
            shutdown_base.child(&server.hostname),
            Executor::EtcdShutdown,
            ServerPhaseData::new(server.clone()),
        )?);
    }
    let shutdown_idx = push_group(
        arena,
        shutdown_base,
        shutdown_children,
        Some(input.num_parallel),
    )?;

    let upgrade_base = base.child("upgrade");
    let mut upgrade_children = Vec::new();
    for server in &masters {
        upgrade_children.push(push_leaf(
            arena,
            upgrade_base.child(&server.hostname),
            Executor::EtcdUpgrade,
            ServerPhaseData::new(server.clone()),
        )?);
    }
    let upgrade_idx = push_group(
        arena,
        upgrade_base,
        upgrade_children,
        Some(input.num_parallel),
    )?;

    let restore_idx = push_leaf(
        arena,
        base.child("restore"),
        Executor::EtcdRestore,
        ServerPhaseData::new(input.lead_master.clone()),
    )?;

    let restart_base = base.child("restart");
    let mut restart_children = Vec::new();
    for server in &masters {
        restart_children.push(push_leaf(
            arena,
            restart_base.child(&server.hostname),
            Executor::EtcdRestart,
            ServerPhaseData::new(server.clone()),
        )?);
    }
    let restart_idx = push_group(
        arena,
        restart_base,
        restart_children,
        Some(input.num_parallel),
    )?;

    // Five sequential super-steps (§4.E "Etcd sub-plan"). Each group is
    // dispatched as a unit only after the previous one fully completes,
    // which by construction gives §5's guarantee that `restart` on any
    // master happens after both `restore` on the lead master and
    // `upgrade` on the same master, without needing extra cross-edges.
    push_group(
        arena,
        base,
        vec![backup_idx, shutdown_idx, upgrade_idx, restore_idx, restart_idx],
        None,
    )
}

fn build_migration(arena: &mut PlanArena, root: &PhaseId, input: &BuildPlanInput) -> Result<usize> {
    let base = root.child("migration");
    let mut children = Vec::new();

    if input.flags.role_migration_needed {
        children.push(push_leaf(
            arena,
            base.child("labels"),
            Executor::MigrationLabels,
            serde_json::Value::Null,
        )?);
        children.push(push_leaf(
            arena,
            base.child("roles"),
            Executor::MigrationRoles,
            serde_json::Value::Null,
        )?);
    }

    if input.flags.link_migration_needed {
        children.push(push_leaf(
            arena,
            base.child("links"),
            Executor::MigrationLinks,
            serde_json::to_value(MigrationLinksData {
                trusted_clusters: input.trusted_clusters.clone(),
            })
            .map_err(CoreError::Serde)?,
        )?);
    }

    push_group(arena, base, children, None)
}

fn build_per_node_group(
    arena: &mut PlanArena,
    base: PhaseId,
    inventory: &[Server],
    limit_parallel: usize,
    executor: Executor,
    data_for: impl Fn(&Server) -> Result<serde_json::Value>,
) -> Result<usize> {
    let mut children = Vec::new();
    for server in inventory {
        let data = data_for(server)?;
        children.push(push_leaf(arena, base.child(&server.hostname), executor, data)?);
    }
    push_group(arena, base, children, Some(limit_parallel))
}

pub fn build_plan(input: BuildPlanInput) -> Result<Plan> {
    let mut arena = PlanArena::new();
    let root_id = PhaseId::new("plan");
    let mut top_children = Vec::new();

    top_children.push(push_leaf(
        &mut arena,
        root_id.child("checks"),
        Executor::Checks,
        serde_json::Value::Null,
    )?);

    top_children.push(push_leaf(
        &mut arena,
        root_id.child("init"),
        Executor::Init,
        serde_json::to_value(InitData {
            inventory: input.inventory.clone(),
        })
        .map_err(CoreError::Serde)?,
    )?);

    top_children.push(build_per_node_group(
        &mut arena,
        root_id.child("bootstrap"),
        &input.inventory,
        input.num_parallel,
        Executor::Bootstrap,
        |server| {
            Ok(serde_json::to_value(BootstrapData {
                server: server.clone(),
                packages: input.bootstrap_packages.clone(),
            })
            .map_err(CoreError::Serde)?)
        },
    )?);

    top_children.push(push_leaf(
        &mut arena,
        root_id.child("pre-update"),
        Executor::PreUpdate,
        serde_json::Value::Null,
    )?);

    if input.flags.coredns_needs_update {
        top_children.push(push_leaf(
            &mut arena,
            root_id.child("coredns"),
            Executor::Coredns,
            serde_json::Value::Null,
        )?);
    }

    if input.flags.dns_needs_update {
        if let Some(dns_package) = &input.dns_package {
            top_children.push(push_leaf(
                &mut arena,
                root_id.child("early-runtime-dns"),
                Executor::EarlyRuntimeDns,
                serde_json::to_value(EarlyRuntimeDnsData {
                    dns_package: dns_package.clone(),
                })
                .map_err(CoreError::Serde)?,
            )?);
        }
    }

    if input.flags.etcd_needs_update {
        top_children.push(build_etcd_subplan(&mut arena, &root_id, &input)?);
    }

    if input.flags.role_migration_needed || input.flags.link_migration_needed {
        top_children.push(build_migration(&mut arena, &root_id, &input)?);
    }

    top_children.push(build_masters(&mut arena, &root_id, &input)?);
    top_children.push(build_nodes(&mut arena, &root_id, &input)?);

    top_children.push(build_per_node_group(
        &mut arena,
        root_id.child("config"),
        &input.inventory,
        input.num_parallel,
        Executor::ConfigPull,
        |server| Ok(ServerPhaseData::new(server.clone())),
    )?);

    top_children.push(build_per_node_group(
        &mut arena,
        root_id.child("runtime"),
        &input.inventory,
        input.num_parallel,
        Executor::Runtime,
        |server| {
            Ok(serde_json::to_value(RuntimeData {
                server: server.clone(),
                packages: input.runtime_packages.clone(),
            })
            .map_err(CoreError::Serde)?)
        },
    )?);

    top_children.push(push_leaf(
        &mut arena,
        root_id.child("app"),
        Executor::App,
        serde_json::to_value(AppData {
            package: input.app_package.clone(),
        })
        .map_err(CoreError::Serde)?,
    )?);

    top_children.push(build_per_node_group(
        &mut arena,
        root_id.child("gc"),
        &input.inventory,
        input.num_parallel,
        Executor::Gc,
        |server| Ok(ServerPhaseData::new(server.clone())),
    )?);

    let root_idx = arena.insert(Phase {
        id: root_id,
        executor: Executor::Group,
        data: serde_json::Value::Null,
        children: top_children,
        depends_on: vec![],
        limit_parallel: None,
    })?;

    arena.validate_dag(root_idx)?;

    Ok(Plan {
        operation_id: input.operation_id,
        cluster_name: input.cluster_name,
        inventory: input.inventory,
        installed_app: input.installed_app,
        update_app: input.update_app,
        arena,
        root: root_idx,
    })
}
