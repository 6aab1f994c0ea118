use actix_web::{web, HttpRequest, HttpResponse};

use crate::{
    constants::CONFIRM_SUCCESS_MESSAGE,
    entities::{
        booking::BookingRequest,
        contact::MessageResponse,
        verification::{ConfirmOutcome, ConfirmVerificationRequest, IssueVerificationRequest},
    },
    errors::AppError,
    utils::get_client_ip::client_context,
    AppState,
};

pub async fn issue_verification(
    state: web::Data<AppState>,
    body: web::Json<IssueVerificationRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.verification_handler.issue(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn confirm_verification(
    state: web::Data<AppState>,
    body: web::Json<ConfirmVerificationRequest>,
) -> Result<HttpResponse, AppError> {
    let message = match state.verification_handler.confirm(body.into_inner()).await? {
        ConfirmOutcome::Verified => CONFIRM_SUCCESS_MESSAGE,
        ConfirmOutcome::AlreadyVerified => "Contact already verified",
    };

    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}

pub async fn book_appointment(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<BookingRequest>,
) -> Result<HttpResponse, AppError> {
    let client = client_context(&req, state.trust_x_forwarded_for);
    let response = state.booking_handler.book(body.into_inner(), &client).await?;
    Ok(HttpResponse::Ok().json(response))
}
