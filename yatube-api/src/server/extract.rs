use crate::server::ServerError;
use axum::{
    Form as AxumForm,
    extract::{
        FromRequest, FromRequestParts, Multipart as AxumMultipart, Query as AxumQuery, Request,
    },
};

#[derive(FromRequestParts, Debug, Clone, Copy, Default)]
#[from_request(via(AxumQuery), rejection(ServerError))]
pub struct Query<T>(pub T);

#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumForm), rejection(ServerError))]
pub struct Form<T>(pub T);

#[derive(Debug)]
pub struct Multipart(pub AxumMultipart);

impl<S> FromRequest<S> for Multipart
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(AxumMultipart::from_request(req, state).await?))
    }
}
