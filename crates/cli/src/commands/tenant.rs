// `folium tenant` — create, list, and retire wiki tenants.

use clap::{Args, Subcommand};

use folium_engine::store::{NewAdmin, Registry};

#[derive(Subcommand)]
pub enum TenantCommand {
    /// Create a tenant with a seeded admin and Home page
    Create(CreateArgs),
    /// List registered tenants
    List,
    /// Deactivate a tenant (data retained)
    Deactivate(KeyArgs),
    /// Reactivate a deactivated tenant
    Reactivate(KeyArgs),
    /// Delete a tenant and all its data
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Display name; the slug is the name with whitespace stripped.
    pub name: String,

    /// Admin user name.
    #[arg(long)]
    admin_name: String,

    /// Admin email address.
    #[arg(long)]
    admin_email: String,
}

#[derive(Debug, Args)]
pub struct KeyArgs {
    /// Tenant id or slug.
    pub tenant: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Tenant id or slug.
    pub tenant: String,

    /// Confirm the irreversible deletion.
    #[arg(long)]
    yes: bool,
}

pub fn run(registry: &Registry, cmd: TenantCommand) -> anyhow::Result<()> {
    match cmd {
        TenantCommand::Create(args) => {
            let admin = NewAdmin {
                name: args.admin_name,
                email: args.admin_email,
                password_hash: String::new(),
            };
            let tenant = registry.create_tenant(&args.name, &admin)?;
            println!("created tenant {} (slug {})", tenant.id, tenant.slug);
            Ok(())
        }
        TenantCommand::List => {
            for tenant in registry.list()? {
                let state = if tenant.active { "active" } else { "inactive" };
                println!("{}  {}  {}  {}", tenant.id, tenant.slug, state, tenant.name);
            }
            Ok(())
        }
        TenantCommand::Deactivate(args) => {
            let id = tenant_id(registry, &args.tenant)?;
            registry.deactivate(&id)?;
            println!("deactivated {id}");
            Ok(())
        }
        TenantCommand::Reactivate(args) => {
            let id = tenant_id(registry, &args.tenant)?;
            registry.reactivate(&id)?;
            println!("reactivated {id}");
            Ok(())
        }
        TenantCommand::Delete(args) => {
            anyhow::ensure!(args.yes, "deletion is irreversible; pass --yes to confirm");
            let id = tenant_id(registry, &args.tenant)?;
            registry.delete_tenant(&id)?;
            println!("deleted {id}");
            Ok(())
        }
    }
}

fn tenant_id(registry: &Registry, key: &str) -> anyhow::Result<String> {
    if registry.get(key)?.is_some() {
        return Ok(key.to_string());
    }
    match registry.get_by_slug(key)? {
        Some(tenant) => Ok(tenant.id),
        None => Ok(key.to_string()),
    }
}
