use crate::{
    api::{liquidation, payroll},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Per-IP limiter refilling `requests_per_min` tokens a minute.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/payroll")
                    // /payroll?month=&year=
                    .service(web::resource("").route(web::get().to(payroll::list_payrolls)))
                    // /payroll/generate
                    .service(
                        web::resource("/generate")
                            .route(web::post().to(payroll::generate_payrolls)),
                    )
                    // /payroll/{id}/payment
                    .service(
                        web::resource("/{payroll_id}/payment")
                            .route(web::patch().to(payroll::update_payment)),
                    )
                    // /payroll/{employee_id}/{year}/{month}
                    .service(
                        web::resource("/{employee_id}/{year}/{month}")
                            .route(web::get().to(payroll::get_payroll)),
                    )
                    .service(
                        web::resource("/{employee_id}/{year}/{month}/preview")
                            .route(web::get().to(payroll::preview_payroll)),
                    ),
            )
            .service(
                web::scope("/liquidation")
                    // /liquidation
                    .service(
                        web::resource("")
                            .route(web::post().to(liquidation::create_liquidation)),
                    )
                    // /liquidation/employee/{employee_id}/history
                    .service(
                        web::resource("/employee/{employee_id}/history")
                            .route(web::get().to(liquidation::liquidation_history)),
                    )
                    // /liquidation/{id}
                    .service(
                        web::resource("/{liquidation_id}")
                            .route(web::get().to(liquidation::get_liquidation)),
                    )
                    .service(
                        web::resource("/{liquidation_id}/regenerate")
                            .route(web::post().to(liquidation::regenerate_liquidation)),
                    )
                    .service(
                        web::resource("/{liquidation_id}/preferences")
                            .route(web::put().to(liquidation::set_preferences)),
                    )
                    .service(
                        web::resource("/{liquidation_id}/pay")
                            .route(web::post().to(liquidation::pay_liquidation)),
                    ),
            ),
    );
}
