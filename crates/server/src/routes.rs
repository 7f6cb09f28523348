//! Route configuration.

use crate::handlers::{builds, identities, launcher, mods, packs, releases, storage, versions};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, patch};
use solder_store::models::{Clients, Teams, Users};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(storage::health_check))
        // Packs
        .route("/packs", get(packs::list_packs).post(packs::create_pack))
        .route(
            "/packs/{pack}",
            get(packs::get_pack).patch(packs::update_pack).delete(packs::delete_pack),
        )
        .route("/packs/{pack}/logo", get(packs::get_pack_logo))
        .route("/packs/{pack}/clients", get(packs::list_pack_clients))
        .route(
            "/packs/{pack}/clients/{client}",
            patch(packs::link_pack_client).delete(packs::unlink_pack_client),
        )
        .route("/packs/{pack}/users", get(packs::list_pack_users))
        .route(
            "/packs/{pack}/users/{user}",
            patch(packs::link_pack_user).delete(packs::unlink_pack_user),
        )
        .route("/packs/{pack}/teams", get(packs::list_pack_teams))
        .route(
            "/packs/{pack}/teams/{team}",
            patch(packs::link_pack_team).delete(packs::unlink_pack_team),
        )
        // Builds
        .route("/packs/{pack}/builds", get(builds::list_builds).post(builds::create_build))
        .route(
            "/packs/{pack}/builds/{build}",
            get(builds::get_build).patch(builds::update_build).delete(builds::delete_build),
        )
        .route("/packs/{pack}/builds/{build}/versions", get(builds::list_build_versions))
        .route(
            "/packs/{pack}/builds/{build}/versions/{version}/file",
            get(builds::get_build_version_file),
        )
        .route(
            "/packs/{pack}/builds/{build}/mods/{mod}/versions/{version}",
            patch(builds::link_build_version).delete(builds::unlink_build_version),
        )
        // Mods
        .route("/mods", get(mods::list_mods).post(mods::create_mod))
        .route(
            "/mods/{mod}",
            get(mods::get_mod).patch(mods::update_mod).delete(mods::delete_mod),
        )
        .route("/mods/{mod}/users", get(mods::list_mod_users))
        .route(
            "/mods/{mod}/users/{user}",
            patch(mods::link_mod_user).delete(mods::unlink_mod_user),
        )
        .route("/mods/{mod}/teams", get(mods::list_mod_teams))
        .route(
            "/mods/{mod}/teams/{team}",
            patch(mods::link_mod_team).delete(mods::unlink_mod_team),
        )
        // Versions
        .route(
            "/mods/{mod}/versions",
            get(versions::list_versions).post(versions::create_version),
        )
        .route(
            "/mods/{mod}/versions/{version}",
            get(versions::get_version)
                .patch(versions::update_version)
                .delete(versions::delete_version),
        )
        .route("/mods/{mod}/versions/{version}/builds", get(versions::list_version_builds))
        .route(
            "/mods/{mod}/versions/{version}/builds/{pack}/{build}",
            patch(versions::link_version_build).delete(versions::unlink_version_build),
        )
        // Releases
        .route(
            "/minecraft",
            get(releases::list_minecraft).put(releases::sync_minecraft),
        )
        .route("/minecraft/{minecraft}/builds", get(releases::list_minecraft_builds))
        .route("/forge", get(releases::list_forge).put(releases::sync_forge))
        .route("/forge/{forge}/builds", get(releases::list_forge_builds))
        // Identities
        .route(
            "/users",
            get(identities::list::<Users>).post(identities::create::<Users>),
        )
        .route(
            "/users/{user}",
            get(identities::get::<Users>).delete(identities::delete::<Users>),
        )
        .route(
            "/teams",
            get(identities::list::<Teams>).post(identities::create::<Teams>),
        )
        .route(
            "/teams/{team}",
            get(identities::get::<Teams>).delete(identities::delete::<Teams>),
        )
        .route("/teams/{team}/users", get(identities::list_team_users))
        .route(
            "/teams/{team}/users/{user}",
            patch(identities::link_team_user).delete(identities::unlink_team_user),
        )
        .route(
            "/clients",
            get(identities::list::<Clients>).post(identities::create::<Clients>),
        )
        .route(
            "/clients/{client}",
            get(identities::get::<Clients>).delete(identities::delete::<Clients>),
        )
        // Launcher
        .route("/modpacks", get(launcher::list_modpacks))
        .route("/modpacks/{pack}", get(launcher::get_modpack))
        .route("/modpacks/{pack}/{build}", get(launcher::get_modpack_build))
        .route("/storage/{category}/{hash}", get(storage::get_blob))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
