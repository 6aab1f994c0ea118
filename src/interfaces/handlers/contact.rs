use actix_web::{web, HttpRequest, HttpResponse};

use crate::{
    entities::contact::ContactForm, errors::AppError, utils::get_client_ip::client_context,
    AppState,
};

pub async fn submit_contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> Result<HttpResponse, AppError> {
    let client = client_context(&req, state.trust_x_forwarded_for);
    let response = state.contact_handler.submit(form.into_inner(), &client).await?;
    Ok(HttpResponse::Ok().json(response))
}
