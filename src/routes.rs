use crate::{
    api::{attendance, payroll},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    if requests_per_min == 0 {
        return None;
    }
    let cfg = GovernorConfigBuilder::default()
        .requests_per_minute(u64::from(requests_per_min))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let scope = web::scope(&config.api_prefix)
        .wrap(from_fn(auth_middleware)) // authentication
        .configure(api_services);

    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => cfg.service(scope.wrap(limiter)), // rate limiting
        None => {
            tracing::warn!("Invalid rate limit settings, protected routes are not rate limited");
            cfg.service(scope)
        }
    };
}

/// Attendance and payroll resources, relative to the API prefix.
pub fn api_services(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            // /attendance
            .service(web::resource("").route(web::post().to(attendance::mark_attendance)))
            // /attendance/check-in
            .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
            // /attendance/daily?date=YYYY-MM-DD
            .service(web::resource("/daily").route(web::get().to(attendance::daily_attendance)))
            // /attendance/{employee_id}
            .service(
                web::resource("/{employee_id}")
                    .route(web::get().to(attendance::employee_attendance)),
            ),
    )
    .service(
        web::scope("/payroll")
            // /payroll/generate
            .service(web::resource("/generate").route(web::post().to(payroll::generate_payroll)))
            // /payroll/run/{employee_id}
            .service(
                web::resource("/run/{employee_id}").route(web::post().to(payroll::run_payroll)),
            )
            // /payroll/salary/{employee_id}
            .service(
                web::resource("/salary/{employee_id}")
                    .route(web::post().to(payroll::update_salary_structure)),
            )
            // /payroll/history
            .service(
                web::resource("/history").route(web::get().to(payroll::all_payroll_history)),
            )
            // /payroll/{employee_id}
            .service(
                web::resource("/{employee_id}")
                    .route(web::get().to(payroll::employee_payroll_history)),
            ),
    );
}
