//! Mutation root.

use std::sync::Arc;

use async_graphql::{Context, ID, Object};

use simple_ecomm_core::{Email, NewOrderLine, Phone};

use super::authorize_mutation;
use super::error::ResultExt;
use super::query::parse_id;
use super::types::{
    CategoryObject, CustomerObject, NewCategoryInput, NewCustomerInput, NewOrderInput,
    NewProductInput, OrderObject, ProductObject, pool,
};
use crate::db::{CategoryRepository, CustomerRepository, ProductRepository};
use crate::models::NewCustomer;
use crate::services::{OrderNotifier, OrderService};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_category(
        &self,
        ctx: &Context<'_>,
        input: NewCategoryInput,
    ) -> async_graphql::Result<CategoryObject> {
        authorize_mutation(ctx)?;
        let parent_id = input.parent_id.as_ref().map(parse_id).transpose()?;
        let category = CategoryRepository::new(pool(ctx)?)
            .create(&input.name, parent_id)
            .await
            .gql()?;
        Ok(CategoryObject(category))
    }

    async fn create_product(
        &self,
        ctx: &Context<'_>,
        input: NewProductInput,
    ) -> async_graphql::Result<ProductObject> {
        authorize_mutation(ctx)?;
        let category_id = input.category_id.as_ref().map(parse_id).transpose()?;
        let product = ProductRepository::new(pool(ctx)?)
            .create(
                &input.name,
                input.description.as_deref(),
                input.price.0,
                category_id,
            )
            .await
            .gql()?;
        Ok(ProductObject(product))
    }

    async fn create_customer(
        &self,
        ctx: &Context<'_>,
        input: NewCustomerInput,
    ) -> async_graphql::Result<CustomerObject> {
        authorize_mutation(ctx)?;
        let new = NewCustomer {
            auth_id: input.auth_id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: Email::parse(&input.email).gql()?,
            phone: Phone::parse(&input.phone).gql()?,
        };
        let customer = CustomerRepository::new(pool(ctx)?)
            .create(&new)
            .await
            .gql()?;
        Ok(CustomerObject(customer))
    }

    /// Place an order. The header and every item are written in one
    /// transaction; each item's price is stored as given.
    async fn create_order(
        &self,
        ctx: &Context<'_>,
        input: NewOrderInput,
    ) -> async_graphql::Result<OrderObject> {
        authorize_mutation(ctx)?;
        let customer_id = parse_id(&input.customer_id)?;
        let lines = input
            .items
            .iter()
            .map(|item| {
                Ok(NewOrderLine {
                    product_id: parse_id(&item.product_id)?,
                    quantity: item.quantity,
                    unit_price: item.price.0,
                })
            })
            .collect::<async_graphql::Result<Vec<_>>>()?;

        let notifier = ctx.data::<Arc<dyn OrderNotifier>>()?;
        let placed = OrderService::new(pool(ctx)?, notifier.as_ref())
            .place_order(customer_id, &lines)
            .await
            .gql()?;
        Ok(placed.into())
    }

    /// Set an order's status. Any status may follow any other.
    async fn update_order_status(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "orderID")] order_id: ID,
        status: String,
    ) -> async_graphql::Result<OrderObject> {
        authorize_mutation(ctx)?;
        let notifier = ctx.data::<Arc<dyn OrderNotifier>>()?;
        let order = OrderService::new(pool(ctx)?, notifier.as_ref())
            .update_status(parse_id(&order_id)?, &status)
            .await
            .gql()?;
        Ok(order.into())
    }
}
