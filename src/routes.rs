use crate::{
    api::{admin, attendance},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{
    middleware::{Condition, from_fn},
    web,
};

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let limit_enabled = config.rate_protected_per_min > 0;
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Condition::new(limit_enabled, protected_limiter)) // rate limiting
            .service(
                web::scope("/attendance")
                    .route("/punch-in", web::post().to(attendance::punch_in))
                    .route("/punch-out", web::post().to(attendance::punch_out))
                    .route("/lunch/start", web::post().to(attendance::start_lunch))
                    .route("/lunch/end", web::post().to(attendance::end_lunch))
                    .route("/leave", web::post().to(attendance::mark_leave))
                    .route("/today", web::get().to(attendance::today_status))
                    .route("/history", web::get().to(attendance::history))
                    // /attendance/{record_id}
                    .route("/{record_id}", web::delete().to(attendance::delete_record)),
            )
            .service(
                web::scope("/admin/attendance")
                    .route("/today", web::get().to(admin::team_today))
                    // /admin/attendance/{user_id}?month=YYYY-MM
                    .route("/{user_id}", web::get().to(admin::staff_month)),
            ),
    );
}
