use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::checkout::OutOfStockItem,
    dto::{
        auth::{
            BuyerSignupRequest, LoginRequest, LoginResponse, SellerSignupRequest,
            UpdateSellerProfileRequest, VerificationSent, VerifyQuery,
        },
        cart::{AddToCartRequest, CartLineView, CartView, UpdateCartItemRequest},
        follows::{FollowedSellers, FollowersView},
        orders::{
            CheckoutCartRequest, OrderLineRequest, OrderList, OrderSummary, OrderWithItems,
            PlaceOrderRequest, PlacedOrder, UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        reviews::{CreateReviewRequest, ReviewList, ReviewWithAuthor},
        stats::{CategorySales, SellerSales},
    },
    error::ErrorData,
    models::{
        ActorKind, Buyer, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, Product,
        Review, Seller,
    },
    response::{ApiResponse, Meta},
    routes::{auth, cart, follows, health, orders, params, products, reviews, stats},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Artisan Market API", description = "Handcrafted goods marketplace"),
    paths(
        health::health_check,
        auth::buyer_signup,
        auth::buyer_login,
        auth::buyer_me,
        auth::seller_signup,
        auth::seller_login,
        auth::seller_me,
        auth::update_profile,
        auth::request_verification,
        auth::verify_seller,
        follows::follow_seller,
        follows::unfollow_seller,
        follows::followers,
        follows::list_follows,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        cart::checkout,
        orders::place_order,
        orders::list_orders,
        orders::list_all_orders,
        orders::get_order,
        orders::update_order_status,
        orders::delete_order,
        reviews::create_review,
        reviews::delete_review,
        reviews::product_reviews,
        reviews::seller_reviews,
        stats::category_sales,
        stats::seller_sales,
    ),
    components(
        schemas(
            ActorKind,
            Buyer,
            Seller,
            Product,
            Order,
            OrderItem,
            OrderStatus,
            PaymentMethod,
            PaymentStatus,
            Review,
            BuyerSignupRequest,
            SellerSignupRequest,
            LoginRequest,
            LoginResponse,
            UpdateSellerProfileRequest,
            VerificationSent,
            VerifyQuery,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartView,
            CartLineView,
            OrderLineRequest,
            PlaceOrderRequest,
            CheckoutCartRequest,
            UpdateOrderStatusRequest,
            OrderSummary,
            OrderWithItems,
            PlacedOrder,
            OrderList,
            OutOfStockItem,
            CreateReviewRequest,
            ReviewWithAuthor,
            ReviewList,
            FollowersView,
            FollowedSellers,
            CategorySales,
            SellerSales,
            ErrorData,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Buyers", description = "Buyer accounts"),
        (name = "Sellers", description = "Seller accounts"),
        (name = "Follows", description = "Buyers following sellers"),
        (name = "Products", description = "Catalog"),
        (name = "Cart", description = "Buyer cart"),
        (name = "Orders", description = "Order placement and fulfilment"),
        (name = "Reviews", description = "Product and seller reviews"),
        (name = "Stats", description = "Sales statistics"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
