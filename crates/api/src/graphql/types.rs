//! GraphQL object types.
//!
//! Each type wraps a row model and resolves its relations lazily through the
//! repositories. Id fields use the `...ID` spelling clients expect.

use async_graphql::{Context, ID, InputObject, Object, SimpleObject};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use simple_ecomm_core::{CatalogProduct, SubCategory, TopCategory};

use super::error::ResultExt;
use super::scalars::Money;
use crate::db::{CategoryRepository, CustomerRepository, OrderRepository, ProductRepository};
use crate::models::{Category, Customer, Order, OrderItem, PlacedOrder, Product};

/// The shared pool from schema data.
pub(crate) fn pool<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a PgPool> {
    ctx.data::<PgPool>()
}

/// A node in the category tree.
pub struct CategoryObject(pub Category);

#[Object(name = "Category")]
impl CategoryObject {
    async fn id(&self) -> ID {
        ID::from(self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    #[graphql(name = "parentID")]
    async fn parent_id(&self) -> Option<ID> {
        self.0.parent_id.map(ID::from)
    }

    /// Direct sub-categories.
    async fn children(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Self>> {
        let children = CategoryRepository::new(pool(ctx)?)
            .list_children(self.0.id)
            .await
            .gql()?;
        Ok(children.into_iter().map(Self).collect())
    }

    /// Products filed directly under this category.
    async fn products(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<ProductObject>> {
        let products = ProductRepository::new(pool(ctx)?)
            .list_by_category(self.0.id)
            .await
            .gql()?;
        Ok(products.into_iter().map(ProductObject).collect())
    }
}

pub struct ProductObject(pub Product);

#[Object(name = "Product")]
impl ProductObject {
    async fn id(&self) -> ID {
        ID::from(self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    async fn price(&self) -> Money {
        Money(self.0.price)
    }

    #[graphql(name = "categoryID")]
    async fn category_id(&self) -> Option<ID> {
        self.0.category_id.map(ID::from)
    }

    async fn category(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<CategoryObject>> {
        let Some(category_id) = self.0.category_id else {
            return Ok(None);
        };
        let category = CategoryRepository::new(pool(ctx)?)
            .get(category_id)
            .await
            .gql()?;
        Ok(Some(CategoryObject(category)))
    }
}

pub struct CustomerObject(pub Customer);

#[Object(name = "Customer")]
impl CustomerObject {
    async fn id(&self) -> ID {
        ID::from(self.0.id)
    }

    /// Identity provider subject id.
    #[graphql(name = "authID")]
    async fn auth_id(&self) -> &str {
        &self.0.auth_id
    }

    async fn first_name(&self) -> &str {
        &self.0.first_name
    }

    async fn last_name(&self) -> &str {
        &self.0.last_name
    }

    async fn email(&self) -> &str {
        self.0.email.as_str()
    }

    async fn phone(&self) -> &str {
        self.0.phone.as_str()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn orders(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<OrderObject>> {
        let orders = OrderRepository::new(pool(ctx)?)
            .list_by_customer(self.0.id)
            .await
            .gql()?;
        Ok(orders.into_iter().map(OrderObject::from).collect())
    }
}

/// An order header. Items are carried along when the order was just placed,
/// otherwise loaded on demand.
pub struct OrderObject {
    order: Order,
    items: Option<Vec<OrderItem>>,
}

impl From<Order> for OrderObject {
    fn from(order: Order) -> Self {
        Self { order, items: None }
    }
}

impl From<PlacedOrder> for OrderObject {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            order: placed.order,
            items: Some(placed.items),
        }
    }
}

#[Object(name = "Order")]
impl OrderObject {
    async fn id(&self) -> ID {
        ID::from(self.order.id)
    }

    #[graphql(name = "customerID")]
    async fn customer_id(&self) -> ID {
        ID::from(self.order.customer_id)
    }

    async fn order_date(&self) -> DateTime<Utc> {
        self.order.order_date
    }

    /// One of `pending`, `processing`, `shipped`, `delivered`, `cancelled`.
    async fn status(&self) -> &'static str {
        self.order.status.as_str()
    }

    async fn items(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<OrderItemObject>> {
        let items = match &self.items {
            Some(items) => items.clone(),
            None => OrderRepository::new(pool(ctx)?)
                .get_items(self.order.id)
                .await
                .gql()?,
        };
        Ok(items.into_iter().map(OrderItemObject).collect())
    }

    async fn customer(&self, ctx: &Context<'_>) -> async_graphql::Result<CustomerObject> {
        let customer = CustomerRepository::new(pool(ctx)?)
            .get(self.order.customer_id)
            .await
            .gql()?;
        Ok(CustomerObject(customer))
    }
}

pub struct OrderItemObject(pub OrderItem);

#[Object(name = "OrderItem")]
impl OrderItemObject {
    async fn id(&self) -> ID {
        ID::from(self.0.id)
    }

    #[graphql(name = "orderID")]
    async fn order_id(&self) -> ID {
        ID::from(self.0.order_id)
    }

    #[graphql(name = "productID")]
    async fn product_id(&self) -> ID {
        ID::from(self.0.product_id)
    }

    async fn quantity(&self) -> i32 {
        self.0.quantity
    }

    /// Unit price paid.
    async fn price(&self) -> Money {
        Money(self.0.price)
    }

    async fn product(&self, ctx: &Context<'_>) -> async_graphql::Result<ProductObject> {
        let product = ProductRepository::new(pool(ctx)?)
            .get(self.0.product_id)
            .await
            .gql()?;
        Ok(ProductObject(product))
    }
}

/// Catalog projection objects.
#[derive(SimpleObject)]
#[graphql(name = "CatalogProduct")]
pub struct CatalogProductObject {
    pub id: ID,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Money>,
}

#[derive(SimpleObject)]
#[graphql(name = "SubCategory")]
pub struct SubCategoryObject {
    pub name: String,
    pub products: Vec<CatalogProductObject>,
}

#[derive(SimpleObject)]
#[graphql(name = "TopCategory")]
pub struct TopCategoryObject {
    pub name: String,
    pub sub_categories: Vec<SubCategoryObject>,
}

impl From<CatalogProduct> for CatalogProductObject {
    fn from(product: CatalogProduct) -> Self {
        Self {
            id: ID::from(product.id),
            name: product.name,
            description: product.description,
            price: product.price.map(Money),
        }
    }
}

impl From<SubCategory> for SubCategoryObject {
    fn from(sub: SubCategory) -> Self {
        Self {
            name: sub.name,
            products: sub.products.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<TopCategory> for TopCategoryObject {
    fn from(top: TopCategory) -> Self {
        Self {
            name: top.name,
            sub_categories: top.sub_categories.into_iter().map(Into::into).collect(),
        }
    }
}

/// Input for `createCategory`.
#[derive(InputObject)]
pub struct NewCategoryInput {
    pub name: String,
    #[graphql(name = "parentID")]
    pub parent_id: Option<ID>,
}

/// Input for `createProduct`.
#[derive(InputObject)]
pub struct NewProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    #[graphql(name = "categoryID")]
    pub category_id: Option<ID>,
}

/// Input for `createCustomer`.
#[derive(InputObject)]
pub struct NewCustomerInput {
    /// Identity provider subject id.
    #[graphql(name = "authID")]
    pub auth_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// One line of `createOrder`.
#[derive(InputObject)]
pub struct OrderItemInput {
    #[graphql(name = "productID")]
    pub product_id: ID,
    pub quantity: i32,
    /// Unit price to charge.
    pub price: Money,
}

/// Input for `createOrder`.
#[derive(InputObject)]
pub struct NewOrderInput {
    #[graphql(name = "customerID")]
    pub customer_id: ID,
    pub items: Vec<OrderItemInput>,
}
