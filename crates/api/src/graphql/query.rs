//! Query root.

use std::str::FromStr;

use async_graphql::{Context, ID, Object};

use simple_ecomm_core::{Email, IdParseError, Phone, Price};

use super::error::{ApiError, ResultExt};
use super::require_caller;
use super::scalars::Money;
use super::types::{
    CategoryObject, CustomerObject, OrderObject, ProductObject, TopCategoryObject, pool,
};
use crate::db::{
    CatalogRepository, CategoryRepository, CustomerRepository, OrderRepository, ProductRepository,
};

/// Parse a GraphQL id into a typed id.
pub(crate) fn parse_id<T>(id: &ID) -> async_graphql::Result<T>
where
    T: FromStr<Err = IdParseError>,
{
    id.as_str().parse::<T>().gql()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn products(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<ProductObject>> {
        let products = ProductRepository::new(pool(ctx)?).list().await.gql()?;
        Ok(products.into_iter().map(ProductObject).collect())
    }

    async fn product(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ProductObject> {
        let product = ProductRepository::new(pool(ctx)?)
            .get(parse_id(&id)?)
            .await
            .gql()?;
        Ok(ProductObject(product))
    }

    async fn categories(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CategoryObject>> {
        let categories = CategoryRepository::new(pool(ctx)?).list().await.gql()?;
        Ok(categories.into_iter().map(CategoryObject).collect())
    }

    async fn category(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<CategoryObject> {
        let category = CategoryRepository::new(pool(ctx)?)
            .get(parse_id(&id)?)
            .await
            .gql()?;
        Ok(CategoryObject(category))
    }

    async fn customers(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CustomerObject>> {
        let customers = CustomerRepository::new(pool(ctx)?).list().await.gql()?;
        Ok(customers.into_iter().map(CustomerObject).collect())
    }

    async fn customer(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<CustomerObject> {
        let customer = CustomerRepository::new(pool(ctx)?)
            .get(parse_id(&id)?)
            .await
            .gql()?;
        Ok(CustomerObject(customer))
    }

    /// Exact-match lookup. Returns null when no customer has this email.
    async fn customer_by_email(
        &self,
        ctx: &Context<'_>,
        email: String,
    ) -> async_graphql::Result<Option<CustomerObject>> {
        let email = Email::parse(&email).gql()?;
        let customer = CustomerRepository::new(pool(ctx)?)
            .get_by_email(&email)
            .await
            .gql()?;
        Ok(customer.map(CustomerObject))
    }

    /// First customer (lowest id) whose email or phone matches.
    async fn customer_by_contact(
        &self,
        ctx: &Context<'_>,
        email: String,
        phone: String,
    ) -> async_graphql::Result<Option<CustomerObject>> {
        let email = Email::parse(&email).gql()?;
        let phone = Phone::parse(&phone).gql()?;
        let customer = CustomerRepository::new(pool(ctx)?)
            .get_by_email_or_phone(&email, &phone)
            .await
            .gql()?;
        Ok(customer.map(CustomerObject))
    }

    async fn orders(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<OrderObject>> {
        let orders = OrderRepository::new(pool(ctx)?).list().await.gql()?;
        Ok(orders.into_iter().map(OrderObject::from).collect())
    }

    async fn order(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<OrderObject> {
        let order = OrderRepository::new(pool(ctx)?)
            .get(parse_id(&id)?)
            .await
            .gql()?;
        Ok(order.into())
    }

    async fn orders_by_customer(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "customerID")] customer_id: ID,
    ) -> async_graphql::Result<Vec<OrderObject>> {
        let orders = OrderRepository::new(pool(ctx)?)
            .list_by_customer(parse_id(&customer_id)?)
            .await
            .gql()?;
        Ok(orders.into_iter().map(OrderObject::from).collect())
    }

    /// Mean list price of the category's products, rounded to cents. Null
    /// when the category has no products.
    async fn average_price_by_category(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "categoryID")] category_id: ID,
    ) -> async_graphql::Result<Option<Money>> {
        let average = ProductRepository::new(pool(ctx)?)
            .average_price_by_category(parse_id(&category_id)?)
            .await
            .gql()?;
        let price = average.map(Price::new).transpose().gql()?;
        Ok(price.map(Money))
    }

    /// Top-level categories with their sub-categories and products.
    async fn catalog(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<TopCategoryObject>> {
        let catalog = CatalogRepository::new(pool(ctx)?).get_catalog().await.gql()?;
        Ok(catalog.into_iter().map(Into::into).collect())
    }

    /// The customer linked to the bearer token.
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<CustomerObject> {
        let caller = require_caller(ctx)?;
        let customer = CustomerRepository::new(pool(ctx)?)
            .get_by_auth_id(&caller.subject)
            .await
            .gql()?
            .ok_or_else(|| ApiError::NotFound("no customer is linked to this account".to_owned()))
            .gql()?;
        Ok(CustomerObject(customer))
    }
}
